//! The typed contract every collection implements.
//!
//! A [`Document`] names its collection, declares its secondary indices as an
//! [`IndexDef`] enum, and describes how a creation draft becomes a record and
//! how a typed patch is merged into one. The generic operations in
//! [`crate::collection`] do the rest.

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tabtalk_shared::RecordId;

/// A secondary index of one collection.
pub trait IndexDef: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Every index declared for the collection.
    fn all() -> &'static [Self];

    /// Stable name persisted in `index_entries.index_name`.
    fn name(self) -> &'static str;

    /// A unique index rejects a second record holding the same value.
    fn is_unique(self) -> bool {
        false
    }

    /// A multi-entry index indexes every element of a sequence field.
    fn is_multi_entry(self) -> bool {
        false
    }
}

/// A record stored in a named collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Collection name, also registered in the `collections` table.
    const COLLECTION: &'static str;

    type Index: IndexDef;

    /// Caller-supplied fields for a new record.
    type Draft;

    /// Fields a caller may change after creation. `None` leaves a field as is.
    type Patch;

    fn key(&self) -> &RecordId;

    /// Merge a draft with creation-time defaults.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Shallow merge: every supplied field replaces the current one.
    fn apply(&mut self, patch: Self::Patch);

    /// Keys this record contributes to `index`. Scalar indices yield one
    /// value, multi-entry indices one per element.
    fn index_values(&self, index: Self::Index) -> Vec<IndexValue>;
}

/// A key stored in a secondary index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexValue {
    Text(String),
    Integer(i64),
}

impl std::fmt::Display for IndexValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl ToSql for IndexValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Text(s) => ToSqlOutput::from(s.as_str()),
            Self::Integer(i) => ToSqlOutput::from(*i),
        })
    }
}

impl From<&RecordId> for IndexValue {
    fn from(id: &RecordId) -> Self {
        Self::Text(id.as_str().to_string())
    }
}

impl From<RecordId> for IndexValue {
    fn from(id: RecordId) -> Self {
        Self::from(&id)
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for IndexValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Timestamps index as Unix milliseconds.
impl From<DateTime<Utc>> for IndexValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Integer(ts.timestamp_millis())
    }
}
