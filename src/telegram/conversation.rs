//! Per-chat conversation state
//!
//! A chat waiting for input has exactly one [`PendingStep`]. Steps live in an
//! expiring cache: a chat that goes quiet simply forgets what it was doing.

use moka::future::Cache;
use std::time::Duration;
use teloxide::types::ChatId;

use crate::core::config;
use crate::core::csv_import::{parse_mark, FIELD_SEPARATOR};

/// Input that steps back in the /add flow
pub const BACK: &str = "Назад";

pub const PROMPT_TITLE: &str = "Введите название музыкального произведения:";
pub const PROMPT_ARTIST: &str = "Введите исполнителя:";
pub const PROMPT_TAGS: &str = "Введите теги через запятую:";
pub const PROMPT_MARK: &str = "Введите оценку от 0 до 5:";
pub const PROMPT_CSV: &str = "Вставьте список музыкальных композиций в формате CSV:";
pub const PROMPT_SONG_REQUEST: &str = "Напишите, какую композицию вы хотите услышать:";
pub const INVALID_MARK: &str = "Оценка должна быть числом от 0 до 5.";
pub const SEPARATOR_NOT_ALLOWED: &str = "Символ ';' использовать нельзя, он разделяет поля в CSV. Введите ещё раз:";

/// What a chat is expected to send next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStep {
    AddTitle,
    AddArtist { title: String },
    AddTags { title: String, artist: String },
    AddMark { title: String, artist: String, tags: String },
    CsvImport,
    SongRequest,
}

impl PendingStep {
    /// Prompt shown when the chat enters this step
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingStep::AddTitle => PROMPT_TITLE,
            PendingStep::AddArtist { .. } => PROMPT_ARTIST,
            PendingStep::AddTags { .. } => PROMPT_TAGS,
            PendingStep::AddMark { .. } => PROMPT_MARK,
            PendingStep::CsvImport => PROMPT_CSV,
            PendingStep::SongRequest => PROMPT_SONG_REQUEST,
        }
    }

    /// Whether this step belongs to the /add flow
    pub fn is_add_flow(&self) -> bool {
        matches!(
            self,
            PendingStep::AddTitle
                | PendingStep::AddArtist { .. }
                | PendingStep::AddTags { .. }
                | PendingStep::AddMark { .. }
        )
    }
}

/// A composition fully collected by the /add flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub tags: String,
    pub mark: i32,
}

/// Result of feeding one message into the /add flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to this step and show its prompt
    Ask(PendingStep),
    /// Input rejected, keep the step and explain why
    Retry(PendingStep, &'static str),
    /// Everything collected
    Submit(NewSong),
    /// "Назад" on the first step leaves the flow
    Exit,
}

/// Advances the /add flow with one text message.
///
/// `step` must be an /add step; any other step exits the flow.
pub fn advance(step: PendingStep, input: &str) -> Transition {
    let input = input.trim();

    if input == BACK {
        return match step {
            PendingStep::AddArtist { .. } => Transition::Ask(PendingStep::AddTitle),
            PendingStep::AddTags { title, .. } => Transition::Ask(PendingStep::AddArtist { title }),
            PendingStep::AddMark { title, artist, .. } => Transition::Ask(PendingStep::AddTags { title, artist }),
            _ => Transition::Exit,
        };
    }

    // Text fields must survive a backup and re-import unchanged
    if input.contains(FIELD_SEPARATOR) && !matches!(step, PendingStep::AddMark { .. }) {
        return Transition::Retry(step, SEPARATOR_NOT_ALLOWED);
    }

    match step {
        PendingStep::AddTitle if input.is_empty() => Transition::Retry(PendingStep::AddTitle, PROMPT_TITLE),
        PendingStep::AddTitle => Transition::Ask(PendingStep::AddArtist {
            title: input.to_string(),
        }),
        PendingStep::AddArtist { title } if input.is_empty() => {
            Transition::Retry(PendingStep::AddArtist { title }, PROMPT_ARTIST)
        }
        PendingStep::AddArtist { title } => Transition::Ask(PendingStep::AddTags {
            title,
            artist: input.to_string(),
        }),
        PendingStep::AddTags { title, artist } => Transition::Ask(PendingStep::AddMark {
            title,
            artist,
            tags: input.to_string(),
        }),
        PendingStep::AddMark { title, artist, tags } => match parse_mark(input) {
            Some(mark) => Transition::Submit(NewSong {
                title,
                artist,
                tags,
                mark,
            }),
            None => Transition::Retry(PendingStep::AddMark { title, artist, tags }, INVALID_MARK),
        },
        PendingStep::CsvImport | PendingStep::SongRequest => Transition::Exit,
    }
}

/// Pending steps keyed by chat, forgotten after the configured idle time
#[derive(Clone)]
pub struct ConversationStore {
    steps: Cache<i64, PendingStep>,
}

impl ConversationStore {
    pub fn new(ttl: Duration) -> Self {
        let steps = Cache::builder()
            .max_capacity(config::conversation::MAX_PENDING)
            .time_to_live(ttl)
            .build();
        Self { steps }
    }

    pub async fn get(&self, chat_id: ChatId) -> Option<PendingStep> {
        self.steps.get(&chat_id.0).await
    }

    pub async fn set(&self, chat_id: ChatId, step: PendingStep) {
        log::debug!("Chat {} now waits for {:?}", chat_id, step);
        self.steps.insert(chat_id.0, step).await;
    }

    /// Drops the pending step, returning it if there was one
    pub async fn cancel(&self, chat_id: ChatId) -> Option<PendingStep> {
        self.steps.remove(&chat_id.0).await
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(config::conversation::ttl())
    }
}
