//! # tabtalk-client
//!
//! Chat instances over a shared [`tabtalk_store`] file. Each
//! [`ChatInstance`] keeps a session, runs commands against the store and
//! mirrors the store into a [`ViewSnapshot`], refreshing it whenever another
//! instance on the same [`BroadcastHub`] channel announces a change.

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod events;
pub mod instance;
pub mod seed;
pub mod state;
pub mod store;
pub mod view;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use broadcast::{BroadcastHub, Broadcaster, Subscription};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{ChangeEvent, EventKind};
pub use instance::ChatInstance;
pub use view::ViewSnapshot;

/// Install the global fmt subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tabtalk_client=debug,tabtalk_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
