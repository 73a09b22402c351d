//! v001 -- Initial schema creation.
//!
//! Creates the collection registry, the record table shared by every
//! collection, and the secondary index table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Collection registry
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY NOT NULL
);

-- ----------------------------------------------------------------
-- Records (one row per document, body is JSON)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,

    PRIMARY KEY (collection, id),
    FOREIGN KEY (collection) REFERENCES collections(name)
);

-- ----------------------------------------------------------------
-- Secondary index entries
-- ----------------------------------------------------------------
-- `value` is declared without a type so integers and text keep their
-- storage class and compare exactly.
CREATE TABLE IF NOT EXISTS index_entries (
    collection TEXT NOT NULL,
    index_name TEXT NOT NULL,
    value              NOT NULL,
    record_id  TEXT NOT NULL,
    is_unique  INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1

    PRIMARY KEY (collection, index_name, value, record_id)
);

CREATE INDEX IF NOT EXISTS idx_index_entries_record
    ON index_entries(collection, record_id);

CREATE UNIQUE INDEX IF NOT EXISTS idx_index_entries_unique
    ON index_entries(collection, index_name, value)
    WHERE is_unique = 1;
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
