//! Async access to the blocking [`Database`].
//!
//! Each instance owns one connection. Calls hop onto tokio's blocking pool
//! so storage I/O suspends the caller without stalling the runtime, and run
//! one at a time per instance.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tabtalk_store::Database;

use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct StoreHandle {
    db: Arc<Mutex<Database>>,
}

impl StoreHandle {
    /// Open (or create) the storage file and run migrations.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let db = tokio::task::spawn_blocking(move || Database::open_at(&path)).await??;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> tabtalk_store::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db.lock().map_err(|_| ClientError::LockPoisoned)?;
            f(&mut guard).map_err(ClientError::from)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use tabtalk_store::{ErrorKind, NewUser};

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "A".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            avatar: None,
            about: String::new(),
        }
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path().join("test.db")).await.unwrap();

        let user = store
            .call(|db| db.create_user(new_user("a@x.com")))
            .await
            .unwrap();
        let id = user.id.clone();
        let fetched = store.call(move |db| db.get_user(&id)).await.unwrap();

        assert_eq!(fetched, Some(user));
    }

    #[tokio::test]
    async fn test_store_errors_keep_their_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreHandle::open(dir.path().join("test.db")).await.unwrap();

        store.call(|db| db.create_user(new_user("a@x.com"))).await.unwrap();
        let err = store
            .call(|db| db.create_user(new_user("a@x.com")))
            .await
            .unwrap_err();

        assert_eq!(err.store_kind(), Some(ErrorKind::ConstraintViolation));
    }
}
