//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers are organized in a testable way, allowing integration tests
//! to use the same handler tree as production code.

mod commands;
mod schema;
mod types;

pub use commands::{
    added_reply, duplicate_reply, ADD_CANCELLED, ADD_FAILED, CSV_DOWNLOAD_FAILED, CSV_EXPECTED, CSV_TOO_LARGE,
    MAX_CSV_DOCUMENT_BYTES, NO_SONGS, REQUEST_THANKS,
};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError, UserInfo};
