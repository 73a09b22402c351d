//! # tabtalk-store
//!
//! Embedded document store for the TabTalk messenger, backed by SQLite.
//!
//! Records live in named collections (`users`, `messages`, `conversations`,
//! `groups`), each keyed by a [`RecordId`](tabtalk_shared::RecordId) and
//! carrying declared secondary indices: unique, non-unique and multi-entry.
//! The crate exposes a synchronous [`Database`] handle with generic
//! insert / get / get-by-index / update / scan operations plus typed domain
//! helpers built on top of them.

pub mod collection;
pub mod conversations;
pub mod database;
pub mod document;
pub mod groups;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use document::{Document, IndexDef, IndexValue};
pub use error::{ErrorKind, Result, StoreError};
pub use messages::SentMessage;
pub use models::*;
