//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod conversation;
pub mod handlers;
pub mod menu;
pub mod notifications;

use teloxide::types::InlineKeyboardButton;

/// Bot type used by every handler
pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use admin::AdminIdentity;
pub use bot::{create_bot, setup_bot_commands, Command};
pub use conversation::{ConversationStore, PendingStep};
pub use handlers::{schema, HandlerDeps, HandlerError};

/// Inline button carrying callback data
pub fn cb(text: impl Into<String>, data: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, data)
}
