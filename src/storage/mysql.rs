//! MySQL repertoire backend.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use std::str::FromStr;

use super::connection::ConnectionSlot;
use super::error::{StorageError, StorageResult};
use super::manager::StorageManager;
use super::models::{normalize_tags, AddSongOutcome, Song, SongRow, MAX_MARK};

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS repertuar (
        id INT AUTO_INCREMENT PRIMARY KEY,
        title VARCHAR(255) DEFAULT '',
        artist VARCHAR(255) DEFAULT '',
        tags VARCHAR(255) DEFAULT '',
        open_time TIMESTAMP DEFAULT NOW(),
        content TEXT,
        mark INT DEFAULT 0,
        UNIQUE(title, artist)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

// Comma-joined tags are expanded into rows by turning them into a JSON array.
// Backslashes and quotes are escaped first so any tag text stays valid JSON;
// CHAR(92) is a backslash regardless of NO_BACKSLASH_ESCAPES.
const SELECT_TAGS: &str = r#"
    SELECT DISTINCT tag
    FROM repertuar,
        JSON_TABLE(
            CONCAT(
                '["',
                REPLACE(
                    REPLACE(
                        REPLACE(tags, CHAR(92 USING utf8mb4), CONCAT(CHAR(92 USING utf8mb4), CHAR(92 USING utf8mb4))),
                        '"', CONCAT(CHAR(92 USING utf8mb4), '"')
                    ),
                    ',', '","'
                ),
                '"]'
            ),
            "$[*]" COLUMNS(
                tag VARCHAR(255) PATH "$"
            )
        ) AS tags"#;

pub struct MysqlStorageManager {
    slot: ConnectionSlot<MySqlConnection>,
}

impl MysqlStorageManager {
    /// Connects and creates the `repertuar` table if it does not exist.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let options = MySqlConnectOptions::from_str(database_url)?.charset("utf8mb4");
        let manager = Self {
            slot: ConnectionSlot::new(options, "mysql"),
        };

        let mut conn = manager.slot.connect_if_need().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
        drop(conn);

        Ok(manager)
    }

    async fn try_add_song(&self, title: &str, artist: &str, tags: &str, mark: i32) -> StorageResult<()> {
        if !(0..=MAX_MARK).contains(&mark) {
            return Err(StorageError::InvalidMark(mark));
        }

        let mut conn = self.slot.connect_if_need().await?;
        sqlx::query("INSERT INTO repertuar (title, artist, tags, mark) VALUES (?, ?, ?, ?)")
            .bind(title)
            .bind(artist)
            .bind(tags)
            .bind(mark)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StorageManager for MysqlStorageManager {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn add_song(&self, title: &str, artist: &str, tags: &str, mark: i32) -> AddSongOutcome {
        match self.try_add_song(title, artist, tags, mark).await {
            Ok(()) => AddSongOutcome::Added,
            Err(e) => {
                let outcome = e.add_song_outcome();
                if outcome == AddSongOutcome::Duplicate {
                    log::info!("Duplicate composition: {} - {}", artist, title);
                } else {
                    log::error!("Failed to add composition {} - {}: {}", artist, title, e);
                }
                outcome
            }
        }
    }

    async fn get_songs_count(&self) -> StorageResult<i64> {
        let mut conn = self.slot.connect_if_need().await?;
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM repertuar")
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn tag_list(&self) -> StorageResult<Vec<String>> {
        let mut conn = self.slot.connect_if_need().await?;
        let tags = sqlx::query_scalar::<_, Option<String>>(SELECT_TAGS)
            .fetch_all(&mut *conn)
            .await?;
        Ok(normalize_tags(tags.into_iter().flatten()))
    }

    async fn get_random_song(&self) -> StorageResult<Option<Song>> {
        let mut conn = self.slot.connect_if_need().await?;
        let row = sqlx::query_as::<_, SongRow>("SELECT id, title, artist, tags, mark FROM repertuar ORDER BY RAND() LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Song::from))
    }

    async fn get_song(&self, song_id: i32) -> StorageResult<Option<Song>> {
        let mut conn = self.slot.connect_if_need().await?;
        let row = sqlx::query_as::<_, SongRow>("SELECT id, title, artist, tags, mark FROM repertuar WHERE id = ?")
            .bind(song_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Song::from))
    }

    async fn update_rating(&self, song_id: i32, mark: i32) -> StorageResult<u64> {
        if !(0..=MAX_MARK).contains(&mark) {
            return Err(StorageError::InvalidMark(mark));
        }

        let mut conn = self.slot.connect_if_need().await?;
        let result = sqlx::query("UPDATE repertuar SET mark = ?, open_time = NOW() WHERE id = ?")
            .bind(mark)
            .bind(song_id)
            .execute(&mut *conn)
            .await?;

        let affected = result.rows_affected();
        if affected > 0 {
            return Ok(affected);
        }

        // MySQL reports changed rows, not matched ones: an identical mark saved
        // within the same second changes nothing.
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM repertuar WHERE id = ?")
            .bind(song_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(u64::from(exists > 0))
    }

    async fn songs(&self) -> StorageResult<Vec<Song>> {
        let mut conn = self.slot.connect_if_need().await?;
        let rows = sqlx::query_as::<_, SongRow>("SELECT id, title, artist, tags, mark FROM repertuar ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Song::from).collect())
    }

    async fn close(&self) {
        self.slot.close().await;
    }
}
