//! Database migration runner.
//!
//! Migrations are executed in order on every [`Database::open_at`] call.  Each
//! migration is guarded by a `user_version` pragma so it runs exactly once.
//!
//! [`Database::open_at`]: crate::Database::open_at

pub mod v001_initial;

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::models::COLLECTIONS;

/// Current schema version.  Bump this and add a new migration module whenever
/// the schema changes.
const CURRENT_VERSION: u32 = 1;

/// Run all pending migrations against the open connection, then register any
/// collection that is missing from the registry.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001_initial");
        v001_initial::up(conn).map_err(|e| StoreError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    ensure_collections(conn)
}

fn ensure_collections(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO collections (name) VALUES (?1)")?;
    for name in COLLECTIONS {
        if stmt.execute(params![name])? > 0 {
            tracing::debug!(collection = name, "created collection");
        }
    }
    Ok(())
}
