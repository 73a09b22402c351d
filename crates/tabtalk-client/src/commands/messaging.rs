use tabtalk_shared::{DeleteScope, MessageKind, RecordId};
use tabtalk_store::{Message, NewMessage};
use tracing::{debug, info};

use crate::error::Result;
use crate::events::ChangeEvent;
use crate::instance::ChatInstance;

/// Send a text message to the active conversation.
///
/// The message and the conversation preview commit together. Other
/// instances hear about it through a `message-created` event; this instance
/// refreshes its own view directly.
pub async fn send_message(instance: &ChatInstance, content: &str) -> Result<Message> {
    send(instance, MessageKind::Text, content.trim(), None).await
}

/// Send a media message (image, video, audio or file) with an optional
/// caption to the active conversation.
pub async fn send_media(
    instance: &ChatInstance,
    kind: MessageKind,
    media_url: &str,
    caption: &str,
) -> Result<Message> {
    send(instance, kind, caption.trim(), Some(media_url.to_string())).await
}

async fn send(
    instance: &ChatInstance,
    kind: MessageKind,
    content: &str,
    media_url: Option<String>,
) -> Result<Message> {
    let inner = instance.inner();
    let user = inner.signed_in_user()?;
    let conversation_id = inner.active_conversation()?;

    let draft = NewMessage {
        kind,
        media_url,
        ..NewMessage::text(conversation_id, user.id, content)
    };
    let sent = inner.store.call(move |db| db.send_message(draft)).await?;
    info!(
        id = %sent.message.id.short(),
        conversation = %sent.conversation.id.short(),
        "message sent"
    );

    inner.publish(ChangeEvent::MessageCreated(sent.message.clone()));
    inner.refresh().await?;
    Ok(sent.message)
}

/// The active conversation's trailing message window, oldest first.
pub async fn load_messages(instance: &ChatInstance) -> Result<Vec<Message>> {
    let inner = instance.inner();
    let conversation_id = inner.active_conversation()?;
    let window = inner.config.message_window;

    inner
        .store
        .call(move |db| db.list_messages(&conversation_id, window))
        .await
}

/// Delete a message for the signed-in user only, or for everyone.
pub async fn delete_message(
    instance: &ChatInstance,
    message_id: &RecordId,
    scope: DeleteScope,
) -> Result<Message> {
    let inner = instance.inner();
    inner.signed_in_user()?;

    let id = message_id.clone();
    let message = inner
        .store
        .call(move |db| db.delete_message(&id, scope))
        .await?;
    debug!(id = %message.id.short(), ?scope, visibility = ?message.visibility, "message deleted");

    inner.refresh().await?;
    Ok(message)
}

pub async fn star_message(
    instance: &ChatInstance,
    message_id: &RecordId,
    starred: bool,
) -> Result<Message> {
    let inner = instance.inner();
    inner.signed_in_user()?;

    let id = message_id.clone();
    let message = inner
        .store
        .call(move |db| db.set_starred(&id, starred))
        .await?;

    inner.refresh().await?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use tabtalk_shared::{ConversationKind, MessageStatus, MessageVisibility};
    use tabtalk_store::{ErrorKind, NewUser};

    use super::*;
    use crate::broadcast::BroadcastHub;
    use crate::commands::conversations::{open_conversation, start_conversation};
    use crate::commands::identity::register;
    use crate::config::ClientConfig;
    use crate::error::ClientError;

    async fn chatting(dir: &tempfile::TempDir, window: usize) -> (ChatInstance, RecordId) {
        let hub = BroadcastHub::new(16);
        let config = ClientConfig {
            message_window: window,
            ..ClientConfig::with_db_path(dir.path().join("chat.db"))
        };
        let instance = ChatInstance::open(&hub, config).await.unwrap();
        register(&instance, "Alice", "alice@x.com", "pw").await.unwrap();
        let bob = instance
            .store()
            .call(|db| {
                db.create_user(NewUser {
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
            start_conversation(&instance, vec![bob.id], ConversationKind::Direct, None)
                .await
                .unwrap();
        open_conversation(&instance, &conversation.id).await.unwrap();
        (instance, conversation.id)
    }

    #[tokio::test]
    async fn test_send_updates_preview_and_view() {
        let dir = tempfile::tempdir().unwrap();
        let (instance, conversation_id) = chatting(&dir, 50).await;

        let message = send_message(&instance, "  hello  ").await.unwrap();

        assert_eq!(message.content, "hello");
        assert_eq!(message.status, MessageStatus::Sent);
        let view = instance.snapshot();
        assert_eq!(view.messages, vec![message.clone()]);
        let conversation = view.conversation(&conversation_id).unwrap();
        assert_eq!(conversation.last_message.as_deref(), Some("hello"));
        assert_eq!(conversation.last_message_time, message.timestamp);
    }

    #[tokio::test]
    async fn test_media_preview() {
        let dir = tempfile::tempdir().unwrap();
        let (instance, conversation_id) = chatting(&dir, 50).await;

        let message = send_media(&instance, MessageKind::Image, "https://x/cat.png", "")
            .await
            .unwrap();

        assert_eq!(message.media_url.as_deref(), Some("https://x/cat.png"));
        let view = instance.snapshot();
        let conversation = view.conversation(&conversation_id).unwrap();
        assert_eq!(conversation.last_message.as_deref(), Some("Photo"));
    }

    #[tokio::test]
    async fn test_load_messages_uses_configured_window() {
        let dir = tempfile::tempdir().unwrap();
        let (instance, _) = chatting(&dir, 3).await;

        for i in 0..5 {
            send_message(&instance, &format!("m{i}")).await.unwrap();
        }

        let contents: Vec<String> = load_messages(&instance)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_delete_and_star() {
        let dir = tempfile::tempdir().unwrap();
        let (instance, _) = chatting(&dir, 50).await;
        let keep = send_message(&instance, "keep").await.unwrap();
        let hide = send_message(&instance, "hide").await.unwrap();

        let starred = star_message(&instance, &keep.id, true).await.unwrap();
        assert!(starred.starred);

        let tombstone = delete_message(&instance, &keep.id, DeleteScope::ForEveryone)
            .await
            .unwrap();
        assert_eq!(tombstone.visibility, MessageVisibility::TombstonedForAll);

        let hidden = delete_message(&instance, &hide.id, DeleteScope::ForMe)
            .await
            .unwrap();
        assert_eq!(hidden.visibility, MessageVisibility::HiddenLocally);

        let listed: Vec<RecordId> = instance.snapshot().messages.into_iter().map(|m| m.id).collect();
        assert_eq!(listed, vec![keep.id]);
    }

    #[tokio::test]
    async fn test_send_without_active_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let hub = BroadcastHub::new(16);
        let instance =
            ChatInstance::open(&hub, ClientConfig::with_db_path(dir.path().join("chat.db")))
                .await
                .unwrap();
        register(&instance, "Alice", "alice@x.com", "pw").await.unwrap();

        assert!(matches!(
            send_message(&instance, "hi").await,
            Err(ClientError::NoActiveConversation)
        ));
        let err = delete_message(&instance, &RecordId::from("nope"), DeleteScope::ForMe)
            .await
            .unwrap_err();
        assert_eq!(err.store_kind(), Some(ErrorKind::NotFound));
    }
}
