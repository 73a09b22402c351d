//! Placeholder credential hashing.
//!
//! This is NOT a security mechanism: the "hash" is a reversible base64
//! encoding of the password and a fixed salt. It only exists so that
//! registration and login have something to compare.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::constants::PASSWORD_SALT;

/// Encode a password into its stored placeholder form.
pub fn hash_password(password: &str) -> String {
    STANDARD.encode(format!("{password}{PASSWORD_SALT}"))
}

/// Compare a candidate password against a stored placeholder hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    hash_password(password) == hash
}
