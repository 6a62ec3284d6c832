//! Repertoire storage: the backend contract, SQL backends and backups

pub mod backup;
mod connection;
pub mod error;
pub mod manager;
pub mod memory;
pub mod models;
pub mod mysql;
pub mod postgres;

use std::sync::Arc;

pub use error::{StorageError, StorageResult};
pub use manager::StorageManager;
pub use memory::MemoryStorageManager;
pub use models::{normalize_tags, AddSongOutcome, Song, MAX_MARK};
pub use mysql::MysqlStorageManager;
pub use postgres::PostgresStorageManager;

/// Backend kinds recognised in a database URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mysql,
    Postgres,
}

impl Backend {
    /// Picks the backend from the URL scheme
    pub fn from_url(database_url: &str) -> StorageResult<Self> {
        let scheme = url::Url::parse(database_url)
            .map(|u| u.scheme().to_ascii_lowercase())
            .map_err(|_| StorageError::UnsupportedBackend(redact(database_url)))?;

        match scheme.as_str() {
            "mysql" => Ok(Backend::Mysql),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            _ => Err(StorageError::UnsupportedBackend(redact(database_url))),
        }
    }
}

/// Keeps only the scheme so credentials never reach logs
fn redact(database_url: &str) -> String {
    match database_url.split_once("://") {
        Some((scheme, _)) => format!("{}://…", scheme),
        None => "<invalid url>".to_string(),
    }
}

/// Connects to the backend named by `database_url` and prepares its table
pub async fn connect(database_url: &str) -> StorageResult<Arc<dyn StorageManager>> {
    let storage: Arc<dyn StorageManager> = match Backend::from_url(database_url)? {
        Backend::Mysql => Arc::new(MysqlStorageManager::connect(database_url).await?),
        Backend::Postgres => Arc::new(PostgresStorageManager::connect(database_url).await?),
    };
    log::info!("Storage backend ready: {}", storage.backend_name());
    Ok(storage)
}
