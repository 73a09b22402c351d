//! Queries and updates for [`Conversation`] records.

use tabtalk_shared::{MessageStatus, RecordId};

use crate::collection::{fetch_by_index, fetch_existing, update_record};
use crate::database::Database;
use crate::document::IndexValue;
use crate::error::Result;
use crate::models::{
    Conversation, ConversationIndex, ConversationPatch, Message, MessageIndex, MessagePatch,
    NewConversation,
};

impl Database {
    pub fn create_conversation(&mut self, conversation: NewConversation) -> Result<Conversation> {
        let conversation: Conversation = self.insert(conversation)?;
        tracing::info!(
            id = %conversation.id,
            kind = ?conversation.kind,
            participants = conversation.participants.len(),
            "created conversation"
        );
        Ok(conversation)
    }

    pub fn get_conversation(&self, id: &RecordId) -> Result<Option<Conversation>> {
        self.get(id)
    }

    /// Conversations `user_id` takes part in, most recently active first.
    pub fn list_conversations_for_user(&self, user_id: &RecordId) -> Result<Vec<Conversation>> {
        let mut conversations =
            self.get_by_index::<Conversation>(ConversationIndex::Participants, user_id)?;
        conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(conversations)
    }

    pub fn update_conversation(
        &mut self,
        id: &RecordId,
        patch: ConversationPatch,
    ) -> Result<Conversation> {
        self.update(id, patch)
    }

    /// Reset the unread counter and mark every message `reader` did not send
    /// as read, in one transaction.
    pub fn mark_conversation_read(
        &mut self,
        id: &RecordId,
        reader: &RecordId,
    ) -> Result<Conversation> {
        self.write(|tx| {
            fetch_existing::<Conversation>(tx, id)?;

            let key = IndexValue::from(id);
            let messages = fetch_by_index::<Message>(tx, MessageIndex::ConversationId, &key)?;
            let mut marked = 0usize;
            for message in messages {
                if message.sender_id == *reader || message.status == MessageStatus::Read {
                    continue;
                }
                update_record::<Message>(
                    tx,
                    &message.id,
                    MessagePatch {
                        status: Some(MessageStatus::Read),
                        ..Default::default()
                    },
                )?;
                marked += 1;
            }

            let conversation = update_record::<Conversation>(
                tx,
                id,
                ConversationPatch {
                    unread_count: Some(0),
                    ..Default::default()
                },
            )?;

            tracing::debug!(conversation = %id, reader = %reader, marked, "marked conversation read");
            Ok(conversation)
        })
    }
}
