//! Repertuar - Telegram bot for a personal repertoire of musical compositions
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging and CSV import
//! - `storage`: The `StorageManager` contract with MySQL and PostgreSQL backends
//! - `telegram`: Telegram bot integration and handlers
//! - `cli`: Command-line interface

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use self::core::{config, AppError, AppResult, BotError};
pub use storage::{AddSongOutcome, Song, StorageManager};
pub use telegram::{schema, HandlerDeps};
