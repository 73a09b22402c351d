//! Queries and updates for [`Message`] records, including the atomic
//! send-message composite.

use tabtalk_shared::{now_millis, DeleteScope, MessageKind, MessageStatus, RecordId};

use crate::collection::{fetch_existing, insert_record, update_record};
use crate::database::Database;
use crate::error::Result;
use crate::models::{
    Conversation, ConversationPatch, Message, MessageIndex, MessagePatch, NewMessage,
};

/// Both records written by [`Database::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message: Message,
    pub conversation: Conversation,
}

impl Database {
    /// Insert a message and refresh its conversation's preview in a single
    /// transaction.
    ///
    /// The conversation's `last_message` / `last_message_time` take the new
    /// message's values and `unread_count` goes up by one. If the
    /// conversation does not exist nothing is written.
    pub fn send_message(&mut self, message: NewMessage) -> Result<SentMessage> {
        self.write(|tx| {
            let conversation = fetch_existing::<Conversation>(tx, &message.conversation_id)?;
            let message =
                insert_record::<Message>(tx, RecordId::generate(), message, now_millis())?;

            let conversation = update_record::<Conversation>(
                tx,
                &conversation.id,
                ConversationPatch {
                    last_message: Some(preview(&message)),
                    last_message_time: Some(message.timestamp),
                    unread_count: Some(conversation.unread_count.saturating_add(1)),
                    ..Default::default()
                },
            )?;

            tracing::debug!(
                id = %message.id,
                conversation = %conversation.id,
                sender = %message.sender_id,
                "message sent"
            );

            Ok(SentMessage {
                message,
                conversation,
            })
        })
    }

    pub fn get_message(&self, id: &RecordId) -> Result<Option<Message>> {
        self.get(id)
    }

    /// The trailing `limit` listed messages of a conversation, oldest first.
    /// Locally hidden messages are skipped; tombstones are kept.
    pub fn list_messages(&self, conversation_id: &RecordId, limit: usize) -> Result<Vec<Message>> {
        let mut messages =
            self.get_by_index::<Message>(MessageIndex::ConversationId, conversation_id)?;
        messages.retain(|m| m.visibility.is_listed());
        messages.sort_by_key(|m| m.timestamp);

        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    /// Every message a user has sent, oldest first.
    pub fn list_messages_by_sender(&self, sender_id: &RecordId) -> Result<Vec<Message>> {
        let mut messages = self.get_by_index::<Message>(MessageIndex::SenderId, sender_id)?;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    pub fn set_message_status(&mut self, id: &RecordId, status: MessageStatus) -> Result<Message> {
        self.update(
            id,
            MessagePatch {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    pub fn set_starred(&mut self, id: &RecordId, starred: bool) -> Result<Message> {
        self.update(
            id,
            MessagePatch {
                starred: Some(starred),
                ..Default::default()
            },
        )
    }

    /// Soft-delete a message. The record stays in storage; only its
    /// visibility changes.
    pub fn delete_message(&mut self, id: &RecordId, scope: DeleteScope) -> Result<Message> {
        self.write(|tx| {
            let current = fetch_existing::<Message>(tx, id)?;
            let visibility = current.visibility.after_delete(scope);
            tracing::debug!(id = %id, ?scope, ?visibility, "deleting message");
            update_record::<Message>(
                tx,
                id,
                MessagePatch {
                    visibility: Some(visibility),
                    ..Default::default()
                },
            )
        })
    }
}

/// Conversation preview text for a message.
fn preview(message: &Message) -> String {
    if !message.content.is_empty() {
        return message.content.clone();
    }
    match message.kind {
        MessageKind::Text => String::new(),
        MessageKind::Image => "Photo".to_string(),
        MessageKind::Video => "Video".to_string(),
        MessageKind::Audio => "Voice message".to_string(),
        MessageKind::File => "File".to_string(),
    }
}
