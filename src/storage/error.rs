//! Storage error types.
//!
//! Used by the backends and by callers of the `StorageManager` API.

use thiserror::Error;

use super::models::AddSongOutcome;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported database URL '{0}': expected mysql:// or postgres://")]
    UnsupportedBackend(String),

    #[error("Mark {0} is out of range 0..=5")]
    InvalidMark(i32),

    #[error("Database connection is not established")]
    NotConnected,
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Maps a failed insert to the outcome reported to callers.
    pub fn add_song_outcome(&self) -> AddSongOutcome {
        match self {
            StorageError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                AddSongOutcome::Duplicate
            }
            StorageError::Database(
                sqlx::Error::Database(_)
                | sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::Protocol(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed,
            )
            | StorageError::NotConnected => AddSongOutcome::DatabaseError,
            _ => AddSongOutcome::OtherError,
        }
    }
}
