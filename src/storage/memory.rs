//! In-process repertoire backend.
//!
//! Keeps compositions in a vector behind an async mutex. Used by the test
//! suite and by anyone who wants to poke at the bot without a database server.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rand::Rng;
use tokio::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::manager::StorageManager;
use super::models::{normalize_tags, split_tags, AddSongOutcome, Song, MAX_MARK};

#[derive(Debug, Clone)]
struct StoredSong {
    song: Song,
    open_time: NaiveDateTime,
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<StoredSong>,
    next_id: i32,
}

#[derive(Debug, Default)]
pub struct MemoryStorageManager {
    inner: Mutex<Inner>,
}

impl MemoryStorageManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last interaction time of a song, if it exists
    pub async fn open_time(&self, song_id: i32) -> Option<NaiveDateTime> {
        let inner = self.inner.lock().await;
        inner.rows.iter().find(|r| r.song.id == song_id).map(|r| r.open_time)
    }
}

#[async_trait]
impl StorageManager for MemoryStorageManager {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn add_song(&self, title: &str, artist: &str, tags: &str, mark: i32) -> AddSongOutcome {
        if !(0..=MAX_MARK).contains(&mark) {
            log::error!("Failed to add composition {} - {}: mark {} is out of range", artist, title, mark);
            return AddSongOutcome::OtherError;
        }

        let mut inner = self.inner.lock().await;
        if inner
            .rows
            .iter()
            .any(|r| r.song.title == title && r.song.artist == artist)
        {
            log::info!("Duplicate composition: {} - {}", artist, title);
            return AddSongOutcome::Duplicate;
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.rows.push(StoredSong {
            song: Song {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
                tags: tags.to_string(),
                mark,
            },
            open_time: Utc::now().naive_utc(),
        });
        AddSongOutcome::Added
    }

    async fn get_songs_count(&self) -> StorageResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.len() as i64)
    }

    async fn tag_list(&self) -> StorageResult<Vec<String>> {
        let inner = self.inner.lock().await;
        Ok(normalize_tags(inner.rows.iter().flat_map(|r| split_tags(&r.song.tags))))
    }

    async fn get_random_song(&self) -> StorageResult<Option<Song>> {
        let inner = self.inner.lock().await;
        if inner.rows.is_empty() {
            return Ok(None);
        }
        let index = rand::rng().random_range(0..inner.rows.len());
        Ok(inner.rows.get(index).map(|r| r.song.clone()))
    }

    async fn get_song(&self, song_id: i32) -> StorageResult<Option<Song>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|r| r.song.id == song_id).map(|r| r.song.clone()))
    }

    async fn update_rating(&self, song_id: i32, mark: i32) -> StorageResult<u64> {
        if !(0..=MAX_MARK).contains(&mark) {
            return Err(StorageError::InvalidMark(mark));
        }

        let mut inner = self.inner.lock().await;
        match inner.rows.iter_mut().find(|r| r.song.id == song_id) {
            Some(row) => {
                row.song.mark = mark;
                row.open_time = Utc::now().naive_utc();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn songs(&self) -> StorageResult<Vec<Song>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().map(|r| r.song.clone()).collect())
    }
}
