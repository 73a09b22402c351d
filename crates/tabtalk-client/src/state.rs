//! Per-instance session state.
//!
//! The [`AppState`] lives behind a `Mutex` inside each instance; commands
//! lock it briefly and never hold the guard across an `.await`.

use std::collections::BTreeSet;

use tabtalk_shared::RecordId;
use tabtalk_store::User;

#[derive(Debug, Default)]
pub struct AppState {
    /// Signed-in user. `None` until `register` or `login` succeeds.
    pub current_user: Option<User>,

    /// Conversation whose messages the view shows.
    pub active_conversation: Option<RecordId>,

    /// Users another instance reported as signed out.
    pub offline_users: BTreeSet<RecordId>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything tied to the signed-in user.
    pub fn sign_out(&mut self) -> Option<User> {
        self.active_conversation = None;
        self.current_user.take()
    }
}
