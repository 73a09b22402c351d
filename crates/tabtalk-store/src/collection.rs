//! Generic collection operations with index maintenance.
//!
//! The free functions take a plain [`Connection`] and assume the caller holds
//! a write transaction (see [`Database::write`]); composites such as
//! [`Database::send_message`] chain several of them inside one transaction.
//! The [`Database`] methods wrap a single operation each.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tabtalk_shared::{now_millis, RecordId};

use crate::database::Database;
use crate::document::{Document, IndexDef, IndexValue};
use crate::error::{Result, StoreError};

/// Index name reported when a primary key collides.
pub const PRIMARY_KEY: &str = "id";

impl Database {
    /// Insert a new record under a freshly generated key.
    pub fn insert<D: Document>(&mut self, draft: D::Draft) -> Result<D> {
        self.insert_with_key(RecordId::generate(), draft)
    }

    /// Insert a new record under a caller-chosen key.
    ///
    /// Fails with [`StoreError::ConstraintViolation`] if the key or any
    /// unique index value is already taken; nothing is written in that case.
    pub fn insert_with_key<D: Document>(&mut self, key: RecordId, draft: D::Draft) -> Result<D> {
        self.write(|tx| insert_record::<D>(tx, key, draft, now_millis()))
    }

    /// Fetch a record by primary key. A missing key is `Ok(None)`.
    pub fn get<D: Document>(&self, key: &RecordId) -> Result<Option<D>> {
        fetch::<D>(self.conn(), key)
    }

    /// Every record whose `index` contains `value`, in insertion order.
    pub fn get_by_index<D: Document>(
        &self,
        index: D::Index,
        value: impl Into<IndexValue>,
    ) -> Result<Vec<D>> {
        fetch_by_index::<D>(self.conn(), index, &value.into())
    }

    /// Merge `patch` into the record stored under `key`.
    pub fn update<D: Document>(&mut self, key: &RecordId, patch: D::Patch) -> Result<D> {
        self.write(|tx| update_record::<D>(tx, key, patch))
    }

    /// Every record in the collection, in insertion order.
    pub fn scan_all<D: Document>(&self) -> Result<Vec<D>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT body FROM records WHERE collection = ?1 ORDER BY rowid ASC")?;
        let rows = stmt.query_map(params![D::COLLECTION], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(decode::<D>(&row?)?);
        }
        Ok(records)
    }

    pub fn count<D: Document>(&self) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![D::COLLECTION],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped operations
// ---------------------------------------------------------------------------

pub(crate) fn fetch<D: Document>(conn: &Connection, key: &RecordId) -> Result<Option<D>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
            params![D::COLLECTION, key.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    body.map(|b| decode::<D>(&b)).transpose()
}

/// Like [`fetch`], but a missing key is an error.
pub(crate) fn fetch_existing<D: Document>(conn: &Connection, key: &RecordId) -> Result<D> {
    fetch::<D>(conn, key)?.ok_or_else(|| StoreError::not_found(D::COLLECTION, key))
}

pub(crate) fn fetch_by_index<D: Document>(
    conn: &Connection,
    index: D::Index,
    value: &IndexValue,
) -> Result<Vec<D>> {
    let mut stmt = conn.prepare(
        "SELECT r.body
         FROM index_entries i
         JOIN records r ON r.collection = i.collection AND r.id = i.record_id
         WHERE i.collection = ?1 AND i.index_name = ?2 AND i.value = ?3
         ORDER BY r.rowid ASC",
    )?;
    let rows = stmt.query_map(params![D::COLLECTION, index.name(), value], |row| {
        row.get::<_, String>(0)
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(decode::<D>(&row?)?);
    }
    Ok(records)
}

pub(crate) fn insert_record<D: Document>(
    conn: &Connection,
    key: RecordId,
    draft: D::Draft,
    now: DateTime<Utc>,
) -> Result<D> {
    let record = D::from_draft(key.clone(), draft, now);
    let entries = index_entries(&record);

    // All checks happen before the first write.
    if fetch::<D>(conn, &key)?.is_some() {
        return Err(StoreError::ConstraintViolation {
            collection: D::COLLECTION,
            index: PRIMARY_KEY,
            value: key.to_string(),
        });
    }
    for (index, values) in &entries {
        if index.is_unique() {
            for value in values {
                ensure_unique::<D>(conn, *index, value, &key)?;
            }
        }
    }

    let body = serde_json::to_string(&record)?;
    conn.execute(
        "INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)",
        params![D::COLLECTION, key.as_str(), body],
    )
    .map_err(|e| constraint_or_sqlite(e, D::COLLECTION, PRIMARY_KEY, key.as_str()))?;

    for (index, values) in &entries {
        add_index_entries::<D>(conn, *index, values, &key)?;
    }

    tracing::debug!(collection = D::COLLECTION, id = %key, "inserted record");

    decode::<D>(&body)
}

pub(crate) fn update_record<D: Document>(
    conn: &Connection,
    key: &RecordId,
    patch: D::Patch,
) -> Result<D> {
    let before = fetch_existing::<D>(conn, key)?;
    let mut after = before.clone();
    after.apply(patch);

    let old_entries = index_entries(&before);
    let new_entries = index_entries(&after);

    let mut changed = Vec::new();
    for ((index, old), (_, new)) in old_entries.iter().zip(new_entries.iter()) {
        if old == new {
            continue;
        }
        if index.is_unique() {
            for value in new.difference(old) {
                ensure_unique::<D>(conn, *index, value, key)?;
            }
        }
        changed.push((*index, new));
    }

    let body = serde_json::to_string(&after)?;
    conn.execute(
        "UPDATE records SET body = ?3 WHERE collection = ?1 AND id = ?2",
        params![D::COLLECTION, key.as_str(), body],
    )?;

    for (index, values) in changed {
        conn.execute(
            "DELETE FROM index_entries
             WHERE collection = ?1 AND index_name = ?2 AND record_id = ?3",
            params![D::COLLECTION, index.name(), key.as_str()],
        )?;
        add_index_entries::<D>(conn, index, values, key)?;
    }

    tracing::debug!(collection = D::COLLECTION, id = %key, "updated record");

    decode::<D>(&body)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Per-index key sets of a record, in declaration order. Sets drop duplicate
/// elements of multi-entry fields.
fn index_entries<D: Document>(record: &D) -> Vec<(D::Index, BTreeSet<IndexValue>)> {
    D::Index::all()
        .iter()
        .map(|index| (*index, record.index_values(*index).into_iter().collect()))
        .collect()
}

fn ensure_unique<D: Document>(
    conn: &Connection,
    index: D::Index,
    value: &IndexValue,
    key: &RecordId,
) -> Result<()> {
    let holder: Option<String> = conn
        .query_row(
            "SELECT record_id FROM index_entries
             WHERE collection = ?1 AND index_name = ?2 AND value = ?3 AND record_id != ?4
             LIMIT 1",
            params![D::COLLECTION, index.name(), value, key.as_str()],
            |row| row.get(0),
        )
        .optional()?;

    match holder {
        Some(_) => Err(StoreError::ConstraintViolation {
            collection: D::COLLECTION,
            index: index.name(),
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

fn add_index_entries<D: Document>(
    conn: &Connection,
    index: D::Index,
    values: &BTreeSet<IndexValue>,
    key: &RecordId,
) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO index_entries (collection, index_name, value, record_id, is_unique)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for value in values {
        stmt.execute(params![
            D::COLLECTION,
            index.name(),
            value,
            key.as_str(),
            index.is_unique(),
        ])
        .map_err(|e| constraint_or_sqlite(e, D::COLLECTION, index.name(), &value.to_string()))?;
    }
    Ok(())
}

/// SQLite's own constraint checks are the backstop for the explicit ones.
fn constraint_or_sqlite(
    err: rusqlite::Error,
    collection: &'static str,
    index: &'static str,
    value: &str,
) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation {
                collection,
                index,
                value: value.to_string(),
            }
        }
        other => StoreError::Sqlite(other),
    }
}

fn decode<D: Document>(body: &str) -> Result<D> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{NewUser, User, UserIndex, UserPatch};

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            avatar: None,
            about: "Available".to_string(),
        }
    }

    #[test]
    fn test_get_after_insert_returns_same_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        let inserted: User = db.insert(new_user("a@x.com", "A")).unwrap();

        assert_eq!(db.get::<User>(&inserted.id).unwrap(), Some(inserted));
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();

        assert_eq!(db.get::<User>(&RecordId::from("nope")).unwrap(), None);
    }

    #[test]
    fn test_duplicate_primary_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        db.insert_with_key::<User>(RecordId::from("u1"), new_user("a@x.com", "A"))
            .unwrap();
        let err = db
            .insert_with_key::<User>(RecordId::from("u1"), new_user("b@x.com", "B"))
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::ConstraintViolation { index: PRIMARY_KEY, .. }
        ));
        assert_eq!(db.count::<User>().unwrap(), 1);
        assert!(db.get_user_by_email("b@x.com").unwrap().is_none());
    }

    #[test]
    fn test_update_round_trip_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let before: User = db.insert(new_user("a@x.com", "A")).unwrap();

        let patch = || UserPatch {
            about: Some("Busy".to_string()),
            ..Default::default()
        };
        let once = db.update::<User>(&before.id, patch()).unwrap();
        let twice = db.update::<User>(&before.id, patch()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            db.get::<User>(&before.id).unwrap(),
            Some(User {
                about: "Busy".to_string(),
                ..before
            })
        );
    }

    #[test]
    fn test_renamed_user_moves_between_index_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();
        let user: User = db.insert(new_user("a@x.com", "Old")).unwrap();

        db.update::<User>(
            &user.id,
            UserPatch {
                username: Some("New".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(db.get_by_index::<User>(UserIndex::Username, "Old").unwrap().is_empty());
        assert_eq!(
            db.get_by_index::<User>(UserIndex::Username, "New").unwrap().len(),
            1
        );
    }

    #[test]
    fn test_scan_all_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("test.db")).unwrap();

        for name in ["c", "a", "b"] {
            db.insert::<User>(new_user(&format!("{name}@x.com"), name)).unwrap();
        }

        let names: Vec<String> = db
            .scan_all::<User>()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(db.count::<User>().unwrap(), 3);
    }

    #[test]
    fn test_concurrent_unique_inserts_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        drop(Database::open_at(&path).unwrap());

        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let mut db = Database::open_at(&path).unwrap();
                    barrier.wait();
                    db.insert::<User>(new_user("same@x.com", &format!("user{i}")))
                        .map(|_| ())
                        .map_err(|e| e.kind())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| **r == Err(ErrorKind::ConstraintViolation))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(rejected, 3);

        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.count::<User>().unwrap(), 1);
    }
}
