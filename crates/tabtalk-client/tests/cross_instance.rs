//! Several instances sharing one storage file and one broadcast channel.

use std::time::Duration;

use tabtalk_client::commands::{conversations, identity, messaging};
use tabtalk_client::{BroadcastHub, ChatInstance, ClientConfig, ViewSnapshot};
use tabtalk_shared::{ConversationKind, RecordId};
use tabtalk_store::ErrorKind;
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn open(hub: &BroadcastHub, dir: &tempfile::TempDir) -> ChatInstance {
    ChatInstance::open(hub, ClientConfig::with_db_path(dir.path().join("shared.db")))
        .await
        .unwrap()
}

/// Wait until a published view satisfies `pred`.
async fn wait_for(
    views: &mut watch::Receiver<ViewSnapshot>,
    pred: impl Fn(&ViewSnapshot) -> bool,
) -> ViewSnapshot {
    timeout(WAIT, async {
        loop {
            if pred(&views.borrow_and_update()) {
                return views.borrow().clone();
            }
            views.changed().await.unwrap();
        }
    })
    .await
    .expect("view never reached the expected state")
}

#[tokio::test]
async fn message_sent_in_one_instance_shows_up_in_the_other() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let alice_tab = open(&hub, &dir).await;
    let bob_tab = open(&hub, &dir).await;

    let alice = identity::register(&alice_tab, "Alice", "alice@x.com", "pw")
        .await
        .unwrap();
    let bob = identity::register(&bob_tab, "Bob", "bob@x.com", "pw")
        .await
        .unwrap();

    let conversation = conversations::start_conversation(
        &alice_tab,
        vec![bob.id.clone()],
        ConversationKind::Direct,
        None,
    )
    .await
    .unwrap();
    conversations::open_conversation(&bob_tab, &conversation.id)
        .await
        .unwrap();
    conversations::open_conversation(&alice_tab, &conversation.id)
        .await
        .unwrap();

    let mut bob_views = bob_tab.views();
    let sent = messaging::send_message(&alice_tab, "hello bob").await.unwrap();

    let view = wait_for(&mut bob_views, |v| v.messages.iter().any(|m| m.id == sent.id)).await;
    assert_eq!(view.messages.last().unwrap().sender_id, alice.id);
    let preview = view.conversation(&conversation.id).unwrap();
    assert_eq!(preview.last_message.as_deref(), Some("hello bob"));
    assert_eq!(preview.unread_count, 1);
}

#[tokio::test]
async fn logout_is_seen_as_offline_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let first = open(&hub, &dir).await;
    let second = open(&hub, &dir).await;

    let alice = identity::register(&first, "Alice", "alice@x.com", "pw")
        .await
        .unwrap();
    identity::register(&second, "Bob", "bob@x.com", "pw")
        .await
        .unwrap();

    let mut views = second.views();
    identity::logout(&first).await.unwrap();

    let view = wait_for(&mut views, |v| v.offline_users.contains(&alice.id)).await;
    assert!(view.user.is_some());
    assert!(first.snapshot().user.is_none());
}

#[tokio::test]
async fn publisher_does_not_hear_itself() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let only = open(&hub, &dir).await;

    identity::register(&only, "Alice", "alice@x.com", "pw")
        .await
        .unwrap();
    let bob = only
        .store()
        .call(|db| {
            db.create_user(tabtalk_store::NewUser {
                username: "Bob".to_string(),
                email: "bob@x.com".to_string(),
                password_hash: String::new(),
                avatar: None,
                about: String::new(),
            })
        })
        .await
        .unwrap();
    let conversation =
        conversations::start_conversation(&only, vec![bob.id], ConversationKind::Direct, None)
            .await
            .unwrap();
    conversations::open_conversation(&only, &conversation.id)
        .await
        .unwrap();

    messaging::send_message(&only, "one").await.unwrap();
    let after_send = only.snapshot().revision;

    // A self-delivered event would trigger one more refresh.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(only.snapshot().revision, after_send);
}

#[tokio::test]
async fn concurrent_registrations_with_one_email() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let a = open(&hub, &dir).await;
    let b = open(&hub, &dir).await;

    let (first, second) = tokio::join!(
        identity::register(&a, "A", "same@x.com", "pw"),
        identity::register(&b, "B", "same@x.com", "pw"),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(failure.store_kind(), Some(ErrorKind::ConstraintViolation));

    let users = a.store().call(|db| db.list_users()).await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn instance_opened_later_sees_committed_state() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let early = open(&hub, &dir).await;
    let alice = identity::register(&early, "Alice", "alice@x.com", "pw")
        .await
        .unwrap();

    let late = open(&hub, &dir).await;
    let resumed = identity::resume_session(&late, &alice.id).await.unwrap();

    assert_eq!(resumed, alice);
    assert!(late.snapshot().conversations.is_empty());
    assert!(matches!(
        identity::resume_session(&late, &RecordId::from("ghost")).await,
        Err(tabtalk_client::ClientError::UnknownUser(_))
    ));
}

#[tokio::test]
async fn seeded_instance_lists_demo_conversations() {
    let dir = tempfile::tempdir().unwrap();
    let hub = BroadcastHub::new(64);
    let config = ClientConfig {
        seed_demo_data: true,
        ..ClientConfig::with_db_path(dir.path().join("shared.db"))
    };
    let instance = ChatInstance::open(&hub, config).await.unwrap();

    identity::register(&instance, "Me", "me@x.com", "pw")
        .await
        .unwrap();

    let view = instance.snapshot();
    assert_eq!(view.conversations.len(), 6);
    assert_eq!(view.total_unread(), 2);
    assert_eq!(conversations::list_groups(&instance).await.unwrap().len(), 1);
}
