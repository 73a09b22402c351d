//! Cross-instance change broadcasting.
//!
//! A [`BroadcastHub`] holds one tokio broadcast channel per name. Every
//! instance connects its own [`Broadcaster`] to a named channel; frames
//! published by one broadcaster reach the subscriptions of every other
//! broadcaster on that channel, never its own.
//!
//! Nothing is retained: a subscription only sees frames published after it
//! was created.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::Result;
use crate::events::{ChangeEvent, EventKind, Frame};

type FrameSender = broadcast::Sender<Arc<Vec<u8>>>;

/// Registry of named broadcast channels shared by every instance on a host.
pub struct BroadcastHub {
    channels: RwLock<HashMap<String, FrameSender>>,
    capacity: usize,
}

impl BroadcastHub {
    /// `capacity` is how many frames each subscription buffers before it
    /// starts lagging. Must be non-zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Connect a new broadcaster to channel `name`, creating it if needed.
    pub async fn connect(&self, name: &str) -> Broadcaster {
        let sender = self.get_or_create(name).await;
        let broadcaster = Broadcaster {
            channel: Arc::from(name),
            origin: Uuid::new_v4(),
            sender,
        };
        tracing::debug!(channel = name, origin = %broadcaster.origin, "broadcaster connected");
        broadcaster
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    async fn get_or_create(&self, name: &str) -> FrameSender {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(name) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

/// One instance's endpoint on a named channel.
#[derive(Clone)]
pub struct Broadcaster {
    channel: Arc<str>,
    origin: Uuid,
    sender: FrameSender,
}

impl Broadcaster {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Identifier stamped on every frame this broadcaster publishes.
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Publish `event` to every other broadcaster on the channel.
    ///
    /// Never waits for handlers. Returns how many receivers were attached
    /// to the channel, including this instance's own (which skip the frame).
    pub fn publish(&self, event: ChangeEvent) -> Result<usize> {
        let kind = event.kind();
        let bytes = Frame {
            origin: self.origin,
            event,
        }
        .encode()?;

        // Sending only fails when nobody is subscribed.
        let receivers = self.sender.send(Arc::new(bytes)).unwrap_or(0);
        tracing::debug!(channel = %self.channel, event = %kind, receivers, "published");
        Ok(receivers)
    }

    /// Run `handler` for every `kind` event published by another
    /// broadcaster on this channel from now on.
    ///
    /// Events are handled one at a time, in publish order. A handler error
    /// or panic is logged and the subscription keeps running. Dropping the
    /// returned [`Subscription`] stops it.
    pub fn subscribe<F, Fut>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(ChangeEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        // Created before spawning so nothing published after this call is missed.
        let mut rx = self.sender.subscribe();
        let origin = self.origin;
        let channel = Arc::clone(&self.channel);

        let task = tokio::spawn(async move {
            loop {
                let bytes = match rx.recv().await {
                    Ok(bytes) => bytes,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            channel = %channel,
                            event = %kind,
                            skipped,
                            "subscriber lagged"
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let frame = match Frame::decode(&bytes) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::warn!(
                            channel = %channel,
                            error = %e,
                            "dropping undecodable frame"
                        );
                        continue;
                    }
                };
                if frame.origin == origin || frame.event.kind() != kind {
                    continue;
                }

                let outcome = AssertUnwindSafe(async { handler(frame.event).await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(
                            channel = %channel,
                            event = %kind,
                            error = %e,
                            "handler failed"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(channel = %channel, event = %kind, "handler panicked");
                    }
                }
            }
            tracing::debug!(channel = %channel, event = %kind, "subscription closed");
        });

        Subscription { kind, task }
    }
}

/// A live subscription. Its handler stops running once this is dropped.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    kind: EventKind,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
