use std::collections::BTreeSet;

/// Highest rating a composition can have
pub const MAX_MARK: i32 = 5;

/// A composition from the repertoire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i32,
    pub title: String,
    pub artist: String,
    /// Comma-separated tags, stored as entered
    pub tags: String,
    /// Rating from 0 to 5
    pub mark: i32,
}

impl Song {
    /// Individual tags of this song, trimmed, without empties
    pub fn tag_list(&self) -> Vec<String> {
        normalize_tags(split_tags(&self.tags))
    }
}

/// Raw row as stored by the SQL backends; text columns are nullable.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SongRow {
    pub id: i32,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub tags: Option<String>,
    pub mark: Option<i32>,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Self {
            id: row.id,
            title: row.title.unwrap_or_default(),
            artist: row.artist.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            mark: row.mark.unwrap_or_default(),
        }
    }
}

/// Outcome of `add_song`.
///
/// Not an error type: imports aggregate these across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddSongOutcome {
    Added,
    Duplicate,
    DatabaseError,
    OtherError,
}

impl AddSongOutcome {
    /// Numeric result code: 0 added, 1 duplicate, 2 database error, 99 other
    pub fn code(self) -> u8 {
        match self {
            AddSongOutcome::Added => 0,
            AddSongOutcome::Duplicate => 1,
            AddSongOutcome::DatabaseError => 2,
            AddSongOutcome::OtherError => 99,
        }
    }
}

pub(crate) fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
}

/// Distinct, trimmed, non-empty tags in sorted order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
