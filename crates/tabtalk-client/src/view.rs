use std::collections::BTreeSet;

use tabtalk_shared::RecordId;
use tabtalk_store::{Conversation, Message, User};

/// Everything a presentation layer renders, re-queried from the store after
/// every local command and every received change event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    /// Increases by one per refresh of this instance.
    pub revision: u64,
    pub user: Option<User>,
    /// The user's conversations, most recent activity first.
    pub conversations: Vec<Conversation>,
    pub active_conversation: Option<RecordId>,
    /// Trailing message window of the active conversation, oldest first.
    pub messages: Vec<Message>,
    pub offline_users: BTreeSet<RecordId>,
}

impl ViewSnapshot {
    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    pub fn conversation(&self, id: &RecordId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == *id)
    }
}
