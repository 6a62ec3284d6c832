//! Core utilities, configuration, and common functionality

pub mod config;
pub mod csv_import;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use csv_import::{import_csv, ImportSummary};
pub use error::{AppError, AppResult, BotError};
pub use logging::{init_logger, log_configuration};
