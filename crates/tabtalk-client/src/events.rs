//! Change events exchanged between instances.
//!
//! Events travel over a [`crate::broadcast::Broadcaster`] as bincode-encoded
//! [`Frame`]s tagged with the publishing instance.

use serde::{Deserialize, Serialize};
use tabtalk_shared::RecordId;
use tabtalk_store::Message;
use uuid::Uuid;

pub const EVENT_MESSAGE_CREATED: &str = "message-created";
pub const EVENT_USER_WENT_OFFLINE: &str = "user-went-offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MessageCreated,
    UserWentOffline,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreated => EVENT_MESSAGE_CREATED,
            Self::UserWentOffline => EVENT_USER_WENT_OFFLINE,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain event. Receivers treat the payload as a hint and re-query the
/// store for the authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// A message was committed, payload is the stored record.
    MessageCreated(Message),
    /// A user signed out of some instance.
    UserWentOffline { user_id: RecordId },
}

impl ChangeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MessageCreated(_) => EventKind::MessageCreated,
            Self::UserWentOffline { .. } => EventKind::UserWentOffline,
        }
    }
}

/// Wire envelope: the event plus the id of the broadcaster that sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Frame {
    pub origin: Uuid,
    pub event: ChangeEvent,
}

impl Frame {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
