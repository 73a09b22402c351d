use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of a stored record. Immutable once the record exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier.
    ///
    /// UUIDv7 leads with a millisecond timestamp, so ids sort roughly by
    /// creation time; only uniqueness is relied upon.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

/// Whether a message shows up in listings.
///
/// Replaces a pair of independent `deleted` / `deletedForEveryone` flags so
/// that the ambiguous "both set" combination cannot be stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageVisibility {
    #[default]
    Visible,
    /// Deleted by the local user; kept in storage, excluded from listings.
    HiddenLocally,
    /// Deleted for every participant; still listed, as a tombstone.
    TombstonedForAll,
}

/// Who a delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteScope {
    ForMe,
    ForEveryone,
}

impl MessageVisibility {
    /// Whether a conversation listing includes the message.
    pub fn is_listed(self) -> bool {
        !matches!(self, Self::HiddenLocally)
    }

    pub fn is_tombstone(self) -> bool {
        matches!(self, Self::TombstonedForAll)
    }

    /// State after a delete. A local hide is sticky: deleting a hidden
    /// message for everyone keeps it hidden here.
    pub fn after_delete(self, scope: DeleteScope) -> Self {
        match (self, scope) {
            (_, DeleteScope::ForMe) => Self::HiddenLocally,
            (Self::HiddenLocally, DeleteScope::ForEveryone) => Self::HiddenLocally,
            (_, DeleteScope::ForEveryone) => Self::TombstonedForAll,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    #[default]
    Direct,
    Group,
}

/// Content type of a message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Video,
    Audio,
    File,
}

/// Current time truncated to whole milliseconds, the precision records are
/// persisted with.
pub fn now_millis() -> DateTime<Utc> {
    let millis = Utc::now().timestamp_millis();
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now)
}

/// Build a timestamp from Unix milliseconds, clamping out-of-range input to
/// the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}
