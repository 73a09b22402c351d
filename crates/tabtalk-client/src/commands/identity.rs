use tabtalk_shared::credentials::{hash_password, verify_password};
use tabtalk_shared::RecordId;
use tabtalk_store::{NewUser, User};
use tracing::info;

use crate::error::{ClientError, Result};
use crate::events::ChangeEvent;
use crate::instance::ChatInstance;
use crate::seed::seed_demo_data;

const DEFAULT_ABOUT: &str = "Hey there! I am using ChatApp";
const AVATAR_BACKGROUND: &str = "25d366";

/// Create an account and sign in as it.
///
/// An email that is already registered fails with a store
/// `ConstraintViolation`.
pub async fn register(
    instance: &ChatInstance,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    let new_user = NewUser {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password_hash: hash_password(password),
        avatar: Some(super::avatar_url(username, AVATAR_BACKGROUND)),
        about: DEFAULT_ABOUT.to_string(),
    };
    let user = instance
        .inner()
        .store
        .call(move |db| db.create_user(new_user))
        .await?;

    info!(user = %user.id.short(), "registered");
    sign_in(instance, user).await
}

/// Sign in with email and password, stamping `lastSeen`.
pub async fn login(instance: &ChatInstance, email: &str, password: &str) -> Result<User> {
    let email = email.trim().to_string();
    let lookup = email.clone();
    let user = instance
        .inner()
        .store
        .call(move |db| db.get_user_by_email(&lookup))
        .await?
        .ok_or(ClientError::UnknownUser(email))?;

    if !verify_password(password, &user.password_hash) {
        return Err(ClientError::InvalidCredentials);
    }

    let id = user.id.clone();
    let user = instance
        .inner()
        .store
        .call(move |db| db.touch_last_seen(&id))
        .await?;

    info!(user = %user.id.short(), "logged in");
    sign_in(instance, user).await
}

/// Restore a session by user id, e.g. in a second instance of the same user.
pub async fn resume_session(instance: &ChatInstance, user_id: &RecordId) -> Result<User> {
    let id = user_id.clone();
    let user = instance
        .inner()
        .store
        .call(move |db| db.get_user(&id))
        .await?
        .ok_or_else(|| ClientError::UnknownUser(user_id.to_string()))?;

    sign_in(instance, user).await
}

/// Stamp `lastSeen`, tell the other instances, and clear the session.
pub async fn logout(instance: &ChatInstance) -> Result<()> {
    let inner = instance.inner();
    let user = inner.signed_in_user()?;

    let id = user.id.clone();
    inner.store.call(move |db| db.touch_last_seen(&id)).await?;
    inner.lock_state()?.sign_out();

    inner.publish(ChangeEvent::UserWentOffline {
        user_id: user.id.clone(),
    });
    info!(user = %user.id.short(), "logged out");

    inner.refresh().await?;
    Ok(())
}

async fn sign_in(instance: &ChatInstance, user: User) -> Result<User> {
    let inner = instance.inner();
    {
        let mut state = inner.lock_state()?;
        state.active_conversation = None;
        state.offline_users.remove(&user.id);
        state.current_user = Some(user.clone());
    }

    if inner.config.seed_demo_data {
        let id = user.id.clone();
        inner.store.call(move |db| seed_demo_data(db, &id)).await?;
    }

    inner.refresh().await?;
    Ok(user)
}
