//! Queries and updates for [`User`] records.

use tabtalk_shared::{now_millis, RecordId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{NewUser, User, UserIndex, UserPatch};

impl Database {
    /// Insert a new user. A taken email fails with
    /// [`StoreError::ConstraintViolation`].
    pub fn create_user(&mut self, user: NewUser) -> Result<User> {
        let user: User = self.insert(user)?;
        tracing::info!(id = %user.id, username = %user.username, "created user");
        Ok(user)
    }

    pub fn get_user(&self, id: &RecordId) -> Result<Option<User>> {
        self.get(id)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .get_by_index::<User>(UserIndex::Email, email)?
            .into_iter()
            .next())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.scan_all()
    }

    pub fn update_user(&mut self, id: &RecordId, patch: UserPatch) -> Result<User> {
        self.update(id, patch)
    }

    /// Stamp `last_seen` with the current time.
    pub fn touch_last_seen(&mut self, id: &RecordId) -> Result<User> {
        self.update(
            id,
            UserPatch {
                last_seen: Some(now_millis()),
                ..Default::default()
            },
        )
    }
}
