/// Application name
pub const APP_NAME: &str = "TabTalk";

/// Storage file name inside the platform data directory
pub const DB_FILE_NAME: &str = "tabtalk.db";

/// Broadcast channel every instance joins unless configured otherwise
pub const DEFAULT_CHANNEL_NAME: &str = "chat_channel";

/// Number of trailing messages returned by a conversation listing
pub const DEFAULT_MESSAGE_WINDOW: usize = 50;

/// Frames buffered per broadcast receiver before it starts lagging
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Suffix appended by the placeholder password hash
pub const PASSWORD_SALT: &str = "salt";

/// Preview shown for a conversation that has no messages yet
pub const EMPTY_CONVERSATION_PREVIEW: &str = "Start chatting";
