use tabtalk_store::{ErrorKind, StoreError};
use thiserror::Error;

/// Errors returned by instance commands.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("No conversation is open")]
    NoActiveConversation,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// A change event could not be encoded or decoded.
    #[error("Broadcast error: {0}")]
    Broadcast(#[from] bincode::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("Storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl ClientError {
    /// Store failure class, if this error came from the store.
    pub fn store_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Store(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
