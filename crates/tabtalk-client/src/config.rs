//! Client configuration loaded from environment variables.
//!
//! All settings have defaults so an instance can start with zero
//! configuration for local development.

use std::path::PathBuf;

use tabtalk_shared::constants::{
    DB_FILE_NAME, DEFAULT_BROADCAST_CAPACITY, DEFAULT_CHANNEL_NAME, DEFAULT_MESSAGE_WINDOW,
};
use tabtalk_store::Database;

/// Per-instance configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Storage file shared by every instance on this host.
    /// Env: `TABTALK_DB_PATH`
    /// Default: `tabtalk.db` in the platform data directory.
    pub db_path: PathBuf,

    /// Name of the broadcast channel instances talk on.
    /// Env: `TABTALK_CHANNEL`
    /// Default: `chat_channel`
    pub channel: String,

    /// How many trailing messages a conversation view loads.
    /// Env: `TABTALK_MESSAGE_WINDOW`
    /// Default: `50`
    pub message_window: usize,

    /// Frames buffered per subscriber before it starts lagging.
    /// Env: `TABTALK_BROADCAST_CAPACITY`
    /// Default: `256`
    pub broadcast_capacity: usize,

    /// Whether bootstrap fills an empty store with demo data.
    /// Env: `TABTALK_SEED` (true/false)
    /// Default: `true`
    pub seed_demo_data: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let db_path = Database::default_path().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "No data directory, using working directory");
            PathBuf::from(DB_FILE_NAME)
        });

        Self {
            db_path,
            channel: DEFAULT_CHANNEL_NAME.to_string(),
            message_window: DEFAULT_MESSAGE_WINDOW,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            seed_demo_data: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("TABTALK_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(channel) = lookup("TABTALK_CHANNEL") {
            if channel.trim().is_empty() {
                tracing::warn!("Empty TABTALK_CHANNEL, using default");
            } else {
                config.channel = channel;
            }
        }

        if let Some(val) = lookup("TABTALK_MESSAGE_WINDOW") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.message_window = n,
                _ => tracing::warn!(value = %val, "Invalid TABTALK_MESSAGE_WINDOW, using default"),
            }
        }

        if let Some(val) = lookup("TABTALK_BROADCAST_CAPACITY") {
            // tokio's broadcast channel panics on a zero capacity.
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.broadcast_capacity = n,
                _ => tracing::warn!(
                    value = %val,
                    "Invalid TABTALK_BROADCAST_CAPACITY, using default"
                ),
            }
        }

        if let Some(val) = lookup("TABTALK_SEED") {
            config.seed_demo_data = val.to_lowercase() != "false";
        }

        config
    }

    /// Defaults pointed at an explicit storage file, without demo data.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: path.into(),
            seed_demo_data: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = ClientConfig::from_lookup(lookup(&[]));

        assert_eq!(config.channel, "chat_channel");
        assert_eq!(config.message_window, 50);
        assert_eq!(config.broadcast_capacity, 256);
        assert!(config.seed_demo_data);
        assert!(config.db_path.ends_with("tabtalk.db"));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TABTALK_DB_PATH", "/tmp/chat.db"),
            ("TABTALK_CHANNEL", "other"),
            ("TABTALK_MESSAGE_WINDOW", "20"),
            ("TABTALK_BROADCAST_CAPACITY", "8"),
            ("TABTALK_SEED", "FALSE"),
        ]));

        assert_eq!(config.db_path, PathBuf::from("/tmp/chat.db"));
        assert_eq!(config.channel, "other");
        assert_eq!(config.message_window, 20);
        assert_eq!(config.broadcast_capacity, 8);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TABTALK_CHANNEL", "  "),
            ("TABTALK_MESSAGE_WINDOW", "lots"),
            ("TABTALK_BROADCAST_CAPACITY", "0"),
        ]));

        assert_eq!(config.channel, "chat_channel");
        assert_eq!(config.message_window, 50);
        assert_eq!(config.broadcast_capacity, 256);
    }
}
