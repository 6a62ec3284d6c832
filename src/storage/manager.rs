use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::backup::write_backup;
use super::error::StorageResult;
use super::models::{AddSongOutcome, Song};

/// Storage contract shared by every repertoire backend.
///
/// Backends are picked once at startup and injected into the bot as
/// `Arc<dyn StorageManager>`.
#[async_trait]
pub trait StorageManager: Send + Sync {
    /// Short backend name for logs ("mysql", "postgres", ...)
    fn backend_name(&self) -> &'static str;

    /// Adds a composition.
    ///
    /// Failures are logged and reported through the outcome so that batch
    /// imports can count them.
    async fn add_song(&self, title: &str, artist: &str, tags: &str, mark: i32) -> AddSongOutcome;

    /// Number of compositions in the repertoire
    async fn get_songs_count(&self) -> StorageResult<i64>;

    /// Distinct tags across all compositions, trimmed and sorted
    async fn tag_list(&self) -> StorageResult<Vec<String>>;

    /// Distinct tags joined for display, e.g. `"jazz, rock"`
    async fn get_tags(&self) -> StorageResult<String> {
        Ok(self.tag_list().await?.join(", "))
    }

    /// A uniformly random composition, `None` when the repertoire is empty
    async fn get_random_song(&self) -> StorageResult<Option<Song>>;

    /// The composition with this id, `None` when it does not exist
    async fn get_song(&self, song_id: i32) -> StorageResult<Option<Song>>;

    /// Sets the rating and refreshes the last interaction time.
    ///
    /// Returns the number of affected rows: 0 means the song was not found.
    async fn update_rating(&self, song_id: i32, mark: i32) -> StorageResult<u64>;

    /// Every composition ordered by id
    async fn songs(&self) -> StorageResult<Vec<Song>>;

    /// Writes all compositions to `path` as `title;artist;tags;mark` lines
    async fn backup(&self, path: &Path) -> StorageResult<PathBuf> {
        let songs = self.songs().await?;
        log::info!("Backing up {} compositions to {}", songs.len(), path.display());
        write_backup(path, &songs).await
    }

    /// Releases the backend's connection, if it holds one
    async fn close(&self) {}
}
