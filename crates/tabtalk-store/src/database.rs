//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.
//!
//! Several `Database` values may be opened on the same file at once (one per
//! application instance). Every write runs inside a `BEGIN IMMEDIATE`
//! transaction, so SQLite serializes writers across connections and a
//! check-then-insert on a unique index cannot interleave with another writer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tabtalk_shared::constants::DB_FILE_NAME;

use crate::error::{Result, StoreError};
use crate::migrations;

/// How long a connection waits for another instance's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/tabtalk/tabtalk.db`
    /// - macOS:   `~/Library/Application Support/com.tabtalk.tabtalk/tabtalk.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\tabtalk\tabtalk\data\tabtalk.db`
    pub fn new() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Path of the default application database.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "tabtalk", "tabtalk").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join(DB_FILE_NAME))
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Run `f` inside an immediate write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`; on error it is rolled
    /// back when dropped, so a failed operation leaves no partial records or
    /// index entries behind.
    pub fn write<T>(&mut self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Names of the collections registered in this database.
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM collections ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StoreError::Sqlite)
    }
}
