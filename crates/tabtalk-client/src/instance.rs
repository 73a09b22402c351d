//! One running chat instance.
//!
//! An instance owns its own storage connection, its own broadcaster on the
//! shared channel and its own session. Any number of instances may run side
//! by side on one storage file; they learn about each other's writes only
//! through change events, after which they re-query the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tabtalk_shared::RecordId;
use tabtalk_store::User;
use tokio::sync::watch;

use crate::broadcast::{BroadcastHub, Broadcaster, Subscription};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{ChangeEvent, EventKind};
use crate::state::AppState;
use crate::store::StoreHandle;
use crate::view::ViewSnapshot;

pub struct ChatInstance {
    inner: Arc<Inner>,
    _subscriptions: Vec<Subscription>,
}

pub(crate) struct Inner {
    pub config: ClientConfig,
    pub store: StoreHandle,
    pub broadcaster: Broadcaster,
    state: Mutex<AppState>,
    view_tx: watch::Sender<ViewSnapshot>,
    revision: AtomicU64,
}

impl ChatInstance {
    /// Open the storage file named by `config` and join its broadcast channel
    /// on `hub`.
    pub async fn open(hub: &BroadcastHub, config: ClientConfig) -> Result<Self> {
        let store = StoreHandle::open(config.db_path.clone()).await?;
        let broadcaster = hub.connect(&config.channel).await;
        let (view_tx, _) = watch::channel(ViewSnapshot::default());

        tracing::info!(
            origin = %broadcaster.origin(),
            channel = %config.channel,
            db = %config.db_path.display(),
            "instance opened"
        );

        let inner = Arc::new(Inner {
            config,
            store,
            broadcaster,
            state: Mutex::new(AppState::new()),
            view_tx,
            revision: AtomicU64::new(0),
        });

        let subscriptions = vec![
            on_event(&inner, EventKind::MessageCreated, Inner::on_message_created),
            on_event(&inner, EventKind::UserWentOffline, Inner::on_user_went_offline),
        ];

        Ok(Self {
            inner,
            _subscriptions: subscriptions,
        })
    }

    /// A receiver that observes every refreshed [`ViewSnapshot`].
    pub fn views(&self) -> watch::Receiver<ViewSnapshot> {
        self.inner.view_tx.subscribe()
    }

    /// The most recently published view.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.view_tx.borrow().clone()
    }

    /// Re-query the store and publish a fresh view.
    pub async fn refresh(&self) -> Result<ViewSnapshot> {
        self.inner.refresh().await
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.lock_state().ok()?.current_user.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &StoreHandle {
        &self.inner.store
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    pub(crate) fn inner(&self) -> &Inner {
        &self.inner
    }
}

/// Subscribe `handler` without keeping the instance alive from its own
/// subscription tasks.
fn on_event<Fut>(
    inner: &Arc<Inner>,
    kind: EventKind,
    handler: fn(Arc<Inner>, ChangeEvent) -> Fut,
) -> Subscription
where
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let weak: Weak<Inner> = Arc::downgrade(inner);
    inner.broadcaster.subscribe(kind, move |event| {
        let weak = weak.clone();
        async move {
            match weak.upgrade() {
                Some(inner) => handler(inner, event).await.map_err(anyhow::Error::from),
                None => Ok(()),
            }
        }
    })
}

impl Inner {
    pub fn lock_state(&self) -> Result<MutexGuard<'_, AppState>> {
        self.state.lock().map_err(|_| ClientError::LockPoisoned)
    }

    /// The signed-in user, or [`ClientError::NotSignedIn`].
    pub fn signed_in_user(&self) -> Result<User> {
        self.lock_state()?
            .current_user
            .clone()
            .ok_or(ClientError::NotSignedIn)
    }

    pub fn active_conversation(&self) -> Result<RecordId> {
        self.lock_state()?
            .active_conversation
            .clone()
            .ok_or(ClientError::NoActiveConversation)
    }

    pub fn publish(&self, event: ChangeEvent) {
        // Delivery is best effort; the local write already committed.
        if let Err(e) = self.broadcaster.publish(event) {
            tracing::warn!(error = %e, "failed to publish change event");
        }
    }

    pub async fn refresh(&self) -> Result<ViewSnapshot> {
        let (user, active_conversation, offline_users) = {
            let state = self.lock_state()?;
            (
                state.current_user.clone(),
                state.active_conversation.clone(),
                state.offline_users.clone(),
            )
        };

        let window = self.config.message_window;
        let (conversations, messages) = match &user {
            Some(user) => {
                let user_id = user.id.clone();
                let active = active_conversation.clone();
                self.store
                    .call(move |db| {
                        let conversations = db.list_conversations_for_user(&user_id)?;
                        let messages = match &active {
                            Some(id) => db.list_messages(id, window)?,
                            None => Vec::new(),
                        };
                        Ok((conversations, messages))
                    })
                    .await?
            }
            None => (Vec::new(), Vec::new()),
        };

        let snapshot = ViewSnapshot {
            revision: self.revision.fetch_add(1, Ordering::Relaxed) + 1,
            user,
            conversations,
            active_conversation,
            messages,
            offline_users,
        };
        tracing::debug!(
            revision = snapshot.revision,
            conversations = snapshot.conversations.len(),
            messages = snapshot.messages.len(),
            "view refreshed"
        );
        self.view_tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    async fn on_message_created(self: Arc<Self>, event: ChangeEvent) -> Result<()> {
        if let ChangeEvent::MessageCreated(message) = event {
            tracing::debug!(
                id = %message.id.short(),
                conversation = %message.conversation_id.short(),
                "message created elsewhere"
            );
            self.lock_state()?.offline_users.remove(&message.sender_id);
        }
        self.refresh().await.map(|_| ())
    }

    async fn on_user_went_offline(self: Arc<Self>, event: ChangeEvent) -> Result<()> {
        if let ChangeEvent::UserWentOffline { user_id } = event {
            tracing::debug!(user = %user_id.short(), "user went offline");
            self.lock_state()?.offline_users.insert(user_id);
        }
        self.refresh().await.map(|_| ())
    }
}
