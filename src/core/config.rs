use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("BOT_API_URL"));

/// Database connection URL
/// Read from DATABASE_URL environment variable
/// The scheme selects the backend: mysql://... or postgres://...
pub static DATABASE_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("DATABASE_URL"));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: logs/repertuar_bot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/repertuar_bot.log".to_string()));

/// Directory for /backup exports
/// Read from BACKUP_DIR environment variable
/// Default: backups
pub static BACKUP_DIR: Lazy<String> = Lazy::new(|| env::var("BACKUP_DIR").unwrap_or_else(|_| "backups".to_string()));

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// Normalizes a Telegram username for comparison: strips a leading `@`
    /// and surrounding whitespace, lowercases (usernames are case-insensitive).
    pub fn normalize_username(raw: &str) -> String {
        raw.trim().trim_start_matches('@').to_lowercase()
    }

    pub(crate) fn parse_chat_id(raw: &str) -> Option<i64> {
        raw.trim().parse::<i64>().ok().filter(|id| *id != 0)
    }

    /// Admin username
    /// Read from ADMIN_USERNAME environment variable
    /// Defaults to empty string if not set (no admin access)
    pub static ADMIN_USERNAME: Lazy<String> =
        Lazy::new(|| env::var("ADMIN_USERNAME").map(|u| normalize_username(&u)).unwrap_or_default());

    /// Chat that receives song requests
    /// Read from ADMIN_CHAT_ID environment variable
    /// When unset, the chat the admin last wrote from is used
    pub static ADMIN_CHAT_ID: Lazy<Option<i64>> =
        Lazy::new(|| env::var("ADMIN_CHAT_ID").ok().and_then(|raw| parse_chat_id(&raw)));
}

/// Conversation configuration
pub mod conversation {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// Default lifetime of a pending conversation step (in seconds)
    pub const DEFAULT_TTL_SECS: u64 = 600; // 10 minutes

    /// Maximum number of chats with a pending step kept in memory
    pub const MAX_PENDING: u64 = 10_000;

    /// Pending step lifetime
    /// Read from CONVERSATION_TTL_SECS environment variable
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("CONVERSATION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TTL_SECS)
    });

    /// Pending step lifetime duration
    pub fn ttl() -> Duration {
        Duration::from_secs(*TTL_SECS)
    }
}

/// Backup configuration
pub mod backup {
    /// Maximum number of backup files kept in BACKUP_DIR
    pub const MAX_BACKUPS: usize = 30;

    /// Backup file name prefix
    pub const FILE_PREFIX: &str = "repertuar_";

    /// Backup file extension
    pub const FILE_EXTENSION: &str = "csv";
}

/// Log file rotation
pub mod log_file {
    /// Size at which the log file is rotated (in bytes)
    pub const MAX_BYTES: u64 = 100_000;

    /// Rotated files kept next to the log file (`.1` is the newest)
    pub const BACKUP_COUNT: usize = 5;
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum attempts to reach the Bot API on startup
    pub const STARTUP_MAX_RETRIES: u32 = 12;

    /// Delay between startup attempts (in seconds)
    pub const STARTUP_RETRY_DELAY_SECS: u64 = 5;

    /// Startup retry delay duration
    pub fn startup_delay() -> Duration {
        Duration::from_secs(STARTUP_RETRY_DELAY_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Long polling holds requests open, so this must exceed the polling timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::admin::{normalize_username, parse_chat_id};
    use super::conversation;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("@SomeAdmin"), "someadmin");
        assert_eq!(normalize_username("  admin "), "admin");
        assert_eq!(normalize_username(""), "");
    }

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("123456"), Some(123456));
        assert_eq!(parse_chat_id(" -100200 "), Some(-100200));
        assert_eq!(parse_chat_id("0"), None);
        assert_eq!(parse_chat_id("abc"), None);
    }

    #[test]
    fn test_conversation_ttl_is_positive() {
        assert!(conversation::ttl().as_secs() > 0);
    }
}
