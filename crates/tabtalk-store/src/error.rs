use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index (or the primary key) already holds this value.
    #[error("Constraint violation: {collection}.{index} already contains {value:?}")]
    ConstraintViolation {
        collection: &'static str,
        index: &'static str,
        value: String,
    },

    /// The targeted key is absent from the collection.
    #[error("Record not found: {collection}/{key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored record body could not be encoded or decoded.
    #[error("Corrupt record body: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Coarse failure classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConstraintViolation,
    NotFound,
    StorageUnavailable,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConstraintViolation { .. } => ErrorKind::ConstraintViolation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Sqlite(_)
            | Self::NoDataDir
            | Self::Io(_)
            | Self::Migration(_)
            | Self::Corrupt(_) => ErrorKind::StorageUnavailable,
        }
    }

    pub(crate) fn not_found(collection: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            collection,
            key: key.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
