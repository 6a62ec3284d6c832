use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

use super::error::StorageResult;
use super::models::Song;
use crate::core::config::backup::{FILE_EXTENSION, FILE_PREFIX};
use crate::core::csv_import::FIELD_SEPARATOR;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Replaces characters that would break a `title;artist;tags;mark` line
fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\r' | '\n' => ' ',
            FIELD_SEPARATOR => ',',
            other => other,
        })
        .collect()
}

/// One backup line, without the trailing newline
pub fn backup_line(song: &Song) -> String {
    format!(
        "{title}{sep}{artist}{sep}{tags}{sep}{mark}",
        title = sanitize_field(&song.title),
        artist = sanitize_field(&song.artist),
        tags = sanitize_field(&song.tags),
        mark = song.mark,
        sep = FIELD_SEPARATOR,
    )
}

/// Writes `songs` to `path`, creating parent directories
pub async fn write_backup(path: &Path, songs: &[Song]) -> StorageResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::tokio::create_dir_all(parent).await?;
    }

    let mut content = String::new();
    for song in songs {
        content.push_str(&backup_line(song));
        content.push('\n');
    }

    fs_err::tokio::write(path, content).await?;
    log::info!("Created backup: {} ({} compositions)", path.display(), songs.len());
    Ok(path.to_path_buf())
}

/// Timestamped backup file path inside `dir`
pub fn backup_path(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "{}{}.{}",
        FILE_PREFIX,
        now.format(TIMESTAMP_FORMAT),
        FILE_EXTENSION
    ))
}

fn parse_backup_timestamp(path: &Path) -> Option<DateTime<Utc>> {
    if path.extension().and_then(|s| s.to_str()) != Some(FILE_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let timestamp = stem.strip_prefix(FILE_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// Backups found in `dir`, newest first. A missing directory has no backups.
pub async fn list_backups(dir: &Path) -> StorageResult<Vec<(PathBuf, DateTime<Utc>)>> {
    let mut backups = Vec::new();

    if !fs_err::tokio::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(backups);
    }

    let mut entries = fs_err::tokio::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(timestamp) = parse_backup_timestamp(&path) {
            backups.push((path, timestamp));
        }
    }

    backups.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(backups)
}

/// Removes all but the newest `keep` backups, returns how many were removed
pub async fn cleanup_old_backups(dir: &Path, keep: usize) -> StorageResult<usize> {
    let backups = list_backups(dir).await?;
    let mut removed = 0;

    for (path, _) in backups.iter().skip(keep) {
        match fs_err::tokio::remove_file(path).await {
            Ok(()) => {
                log::info!("Removed old backup: {}", path.display());
                removed += 1;
            }
            Err(e) => log::warn!("Failed to remove old backup {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}
