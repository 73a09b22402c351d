//! Records persisted in the four collections, with their creation drafts,
//! typed patches and index declarations.
//!
//! Every record derives `Serialize` and `Deserialize`; bodies are stored as
//! camelCase JSON with timestamps in Unix milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabtalk_shared::{
    ConversationKind, MessageKind, MessageStatus, MessageVisibility, RecordId,
};

use crate::document::{Document, IndexDef, IndexValue};

/// Every collection created on open.
pub const COLLECTIONS: [&str; 4] = [
    User::COLLECTION,
    Message::COLLECTION,
    Conversation::COLLECTION,
    Group::COLLECTION,
];

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub username: String,
    /// Unique across the collection.
    pub email: String,
    /// Placeholder hash, see `tabtalk_shared::credentials`.
    pub password_hash: String,
    pub avatar: Option<String>,
    /// Free-form "about" line shown under the name.
    pub about: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub about: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIndex {
    Email,
    Username,
}

impl IndexDef for UserIndex {
    fn all() -> &'static [Self] {
        &[Self::Email, Self::Username]
    }

    fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Username => "username",
        }
    }

    fn is_unique(self) -> bool {
        matches!(self, Self::Email)
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    type Index = UserIndex;
    type Draft = NewUser;
    type Patch = UserPatch;

    fn key(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: draft.username,
            email: draft.email,
            password_hash: draft.password_hash,
            avatar: draft.avatar,
            about: draft.about,
            created_at: now,
            last_seen: now,
        }
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = Some(avatar);
        }
        if let Some(about) = patch.about {
            self.about = about;
        }
        if let Some(last_seen) = patch.last_seen {
            self.last_seen = last_seen;
        }
    }

    fn index_values(&self, index: UserIndex) -> Vec<IndexValue> {
        match index {
            UserIndex::Email => vec![self.email.as_str().into()],
            UserIndex::Username => vec![self.username.as_str().into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message. Content is immutable once sent; only status, visibility
/// and the starred flag change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: RecordId,
    pub conversation_id: RecordId,
    pub sender_id: RecordId,
    pub content: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
    /// Present for compatibility with edited messages; nothing sets it yet.
    pub edited: bool,
    pub visibility: MessageVisibility,
    pub starred: bool,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: RecordId,
    pub sender_id: RecordId,
    pub content: String,
    pub kind: MessageKind,
    pub media_url: Option<String>,
    /// Back-dates the message (imports and seed data). Defaults to now.
    pub sent_at: Option<DateTime<Utc>>,
    /// Initial status for imported messages. Defaults to `sent`.
    pub status: Option<MessageStatus>,
}

impl NewMessage {
    /// A plain text message stamped now with status `sent`.
    pub fn text(
        conversation_id: RecordId,
        sender_id: RecordId,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id,
            sender_id,
            content: content.into(),
            kind: MessageKind::Text,
            media_url: None,
            sent_at: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub status: Option<MessageStatus>,
    pub visibility: Option<MessageVisibility>,
    pub starred: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageIndex {
    ConversationId,
    SenderId,
    Timestamp,
}

impl IndexDef for MessageIndex {
    fn all() -> &'static [Self] {
        &[Self::ConversationId, Self::SenderId, Self::Timestamp]
    }

    fn name(self) -> &'static str {
        match self {
            Self::ConversationId => "conversationId",
            Self::SenderId => "senderId",
            Self::Timestamp => "timestamp",
        }
    }
}

impl Document for Message {
    const COLLECTION: &'static str = "messages";
    type Index = MessageIndex;
    type Draft = NewMessage;
    type Patch = MessagePatch;

    fn key(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewMessage, now: DateTime<Utc>) -> Self {
        Self {
            id,
            conversation_id: draft.conversation_id,
            sender_id: draft.sender_id,
            content: draft.content,
            kind: draft.kind,
            media_url: draft.media_url,
            timestamp: draft.sent_at.unwrap_or(now),
            status: draft.status.unwrap_or_default(),
            edited: false,
            visibility: MessageVisibility::Visible,
            starred: false,
        }
    }

    fn apply(&mut self, patch: MessagePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(visibility) = patch.visibility {
            self.visibility = visibility;
        }
        if let Some(starred) = patch.starred {
            self.starred = starred;
        }
    }

    fn index_values(&self, index: MessageIndex) -> Vec<IndexValue> {
        match index {
            MessageIndex::ConversationId => vec![(&self.conversation_id).into()],
            MessageIndex::SenderId => vec![(&self.sender_id).into()],
            MessageIndex::Timestamp => vec![self.timestamp.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A direct or group conversation.
///
/// `last_message`, `last_message_time` and `unread_count` are a denormalized
/// preview kept in step with the message collection by
/// [`Database::send_message`](crate::Database::send_message).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: RecordId,
    pub participants: Vec<RecordId>,
    pub kind: ConversationKind,
    pub group_name: Option<String>,
    pub group_avatar: Option<String>,
    pub last_message: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_message_time: DateTime<Utc>,
    pub unread_count: u32,
}

impl Conversation {
    pub fn has_participant(&self, user_id: &RecordId) -> bool {
        self.participants.contains(user_id)
    }

    /// The other side of a direct conversation.
    pub fn peer_of(&self, user_id: &RecordId) -> Option<&RecordId> {
        match self.kind {
            ConversationKind::Direct => self.participants.iter().find(|p| *p != user_id),
            ConversationKind::Group => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewConversation {
    pub participants: Vec<RecordId>,
    pub kind: ConversationKind,
    pub group_name: Option<String>,
    pub group_avatar: Option<String>,
    pub last_message: Option<String>,
    /// Defaults to now.
    pub last_message_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationPatch {
    pub participants: Option<Vec<RecordId>>,
    pub group_name: Option<String>,
    pub group_avatar: Option<String>,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationIndex {
    Participants,
    LastMessageTime,
}

impl IndexDef for ConversationIndex {
    fn all() -> &'static [Self] {
        &[Self::Participants, Self::LastMessageTime]
    }

    fn name(self) -> &'static str {
        match self {
            Self::Participants => "participants",
            Self::LastMessageTime => "lastMessageTime",
        }
    }

    fn is_multi_entry(self) -> bool {
        matches!(self, Self::Participants)
    }
}

impl Document for Conversation {
    const COLLECTION: &'static str = "conversations";
    type Index = ConversationIndex;
    type Draft = NewConversation;
    type Patch = ConversationPatch;

    fn key(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewConversation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            participants: draft.participants,
            kind: draft.kind,
            group_name: draft.group_name,
            group_avatar: draft.group_avatar,
            last_message: draft.last_message,
            last_message_time: draft.last_message_time.unwrap_or(now),
            unread_count: 0,
        }
    }

    fn apply(&mut self, patch: ConversationPatch) {
        if let Some(participants) = patch.participants {
            self.participants = participants;
        }
        if let Some(group_name) = patch.group_name {
            self.group_name = Some(group_name);
        }
        if let Some(group_avatar) = patch.group_avatar {
            self.group_avatar = Some(group_avatar);
        }
        if let Some(last_message) = patch.last_message {
            self.last_message = Some(last_message);
        }
        if let Some(last_message_time) = patch.last_message_time {
            self.last_message_time = last_message_time;
        }
        if let Some(unread_count) = patch.unread_count {
            self.unread_count = unread_count;
        }
    }

    fn index_values(&self, index: ConversationIndex) -> Vec<IndexValue> {
        match index {
            ConversationIndex::Participants => {
                self.participants.iter().map(IndexValue::from).collect()
            }
            ConversationIndex::LastMessageTime => vec![self.last_message_time.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: RecordId,
    pub name: String,
    pub avatar: Option<String>,
    pub members: Vec<RecordId>,
    pub admin: RecordId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub avatar: Option<String>,
    pub members: Vec<RecordId>,
    pub admin: RecordId,
}

#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub members: Option<Vec<RecordId>>,
    pub admin: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupIndex {
    Members,
}

impl IndexDef for GroupIndex {
    fn all() -> &'static [Self] {
        &[Self::Members]
    }

    fn name(self) -> &'static str {
        match self {
            Self::Members => "members",
        }
    }

    fn is_multi_entry(self) -> bool {
        true
    }
}

impl Document for Group {
    const COLLECTION: &'static str = "groups";
    type Index = GroupIndex;
    type Draft = NewGroup;
    type Patch = GroupPatch;

    fn key(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: NewGroup, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            avatar: draft.avatar,
            members: draft.members,
            admin: draft.admin,
            created_at: now,
        }
    }

    fn apply(&mut self, patch: GroupPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = Some(avatar);
        }
        if let Some(members) = patch.members {
            self.members = members;
        }
        if let Some(admin) = patch.admin {
            self.admin = admin;
        }
    }

    fn index_values(&self, index: GroupIndex) -> Vec<IndexValue> {
        match index {
            GroupIndex::Members => self.members.iter().map(IndexValue::from).collect(),
        }
    }
}
