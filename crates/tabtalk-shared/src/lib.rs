//! # tabtalk-shared
//!
//! Types shared by the store and the client: record identifiers, the tagged
//! enums persisted inside records, and application-wide constants.

pub mod constants;
pub mod credentials;
pub mod types;

pub use types::*;
