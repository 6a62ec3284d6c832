//! Batch import of compositions from semicolon-separated text
//!
//! Line format: `title;artist[;tags[;mark]]`, one composition per line.
//! Malformed lines are skipped and counted; they never abort the batch.

use thiserror::Error;

use crate::storage::{AddSongOutcome, StorageManager, MAX_MARK};

/// Field separator used by imports and backups
pub const FIELD_SEPARATOR: char = ';';

/// One composition parsed from an import line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub title: String,
    pub artist: String,
    pub tags: String,
    pub mark: i32,
}

/// Why an import line was skipped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvLineError {
    #[error("expected 2 to 4 fields, got {0}")]
    FieldCount(usize),

    #[error("title is empty")]
    EmptyTitle,

    #[error("artist is empty")]
    EmptyArtist,

    #[error("mark must be an integer from 0 to 5, got '{0}'")]
    InvalidMark(String),
}

/// Parses a single import line.
///
/// Returns `Ok(None)` for blank lines, which are neither imported nor counted.
pub fn parse_line(line: &str) -> Result<Option<CsvRecord>, CsvLineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if !(2..=4).contains(&fields.len()) {
        return Err(CsvLineError::FieldCount(fields.len()));
    }

    let title = fields[0];
    let artist = fields[1];
    if title.is_empty() {
        return Err(CsvLineError::EmptyTitle);
    }
    if artist.is_empty() {
        return Err(CsvLineError::EmptyArtist);
    }

    let tags = fields.get(2).copied().unwrap_or_default();
    let mark = match fields.get(3).copied() {
        None | Some("") => 0,
        Some(raw) => parse_mark(raw).ok_or_else(|| CsvLineError::InvalidMark(raw.to_string()))?,
    };

    Ok(Some(CsvRecord {
        title: title.to_string(),
        artist: artist.to_string(),
        tags: tags.to_string(),
        mark,
    }))
}

/// Parses a rating in `0..=5`
pub fn parse_mark(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|mark| (0..=MAX_MARK).contains(mark))
}

/// Result of parsing a whole import text
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub records: Vec<CsvRecord>,
    pub skipped: usize,
}

/// Parses every line of an import text, counting malformed lines
pub fn parse_batch(text: &str) -> ParsedBatch {
    let mut batch = ParsedBatch::default();

    for (idx, line) in text.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(record)) => batch.records.push(record),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Skipping import line {}: {} ({:?})", idx + 1, e, line);
                batch.skipped += 1;
            }
        }
    }

    batch
}

/// Per-outcome counters for one import
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
    pub db_errors: usize,
    pub other_errors: usize,
    pub skipped: usize,
}

impl ImportSummary {
    /// Tallies one `add_song` outcome
    pub fn record(&mut self, outcome: AddSongOutcome) {
        match outcome {
            AddSongOutcome::Added => self.added += 1,
            AddSongOutcome::Duplicate => self.duplicates += 1,
            AddSongOutcome::DatabaseError => self.db_errors += 1,
            AddSongOutcome::OtherError => self.other_errors += 1,
        }
    }

    fn has_failures(&self) -> bool {
        self.duplicates > 0 || self.db_errors > 0 || self.other_errors > 0 || self.skipped > 0
    }

    fn counters(&self) -> String {
        let mut text = format!(
            "Дубликатов - {} шт\nОшибок с БД - {} шт\nПрочих ошибок - {} шт",
            self.duplicates, self.db_errors, self.other_errors
        );
        if self.skipped > 0 {
            text.push_str(&format!("\nПропущено строк - {} шт", self.skipped));
        }
        text
    }

    /// Renders the single reply sent after an import
    pub fn to_message(&self) -> String {
        let success = format!("Музыкальные композиции успешно добавлены ({} шт)", self.added);

        if !self.has_failures() {
            success
        } else if self.added > 0 {
            format!("{}\n{}", success, self.counters())
        } else {
            format!("Музыкальные композиции не были добавлены:\n{}", self.counters())
        }
    }
}

/// Imports every well-formed line of `text` into storage
pub async fn import_csv(storage: &dyn StorageManager, text: &str) -> ImportSummary {
    let batch = parse_batch(text);
    log::info!(
        "Received CSV import with {} compositions ({} malformed lines)",
        batch.records.len(),
        batch.skipped
    );

    let mut summary = ImportSummary {
        skipped: batch.skipped,
        ..Default::default()
    };

    for record in &batch.records {
        log::info!("Adding: {} - {} [{}]", record.artist, record.title, record.tags);
        let outcome = storage
            .add_song(&record.title, &record.artist, &record.tags, record.mark)
            .await;
        summary.record(outcome);
    }

    log::info!("CSV import finished: {:?}", summary);
    summary
}
