use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};
use teloxide::RequestError;

use super::keyboards::rating_keyboard;
use crate::storage::MAX_MARK;
use crate::telegram::handlers::HandlerDeps;
use crate::telegram::Bot;

const EDIT_PREFIX: &str = "edit_";
const UPDATE_RATING_PREFIX: &str = "update_rating_";

pub const RATING_SAVED: &str = "Оценка успешно сохранена!";
pub const SONG_NOT_FOUND: &str = "Композиция не найдена в базе данных";
pub const RATING_FAILED: &str = "Не удалось сохранить оценку, смотрите логи";

/// Actions carried in inline button callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// `edit_<song_id>`: expand the rating row
    Edit { song_id: i32 },
    /// `update_rating_<song_id>_<mark>`: save a mark
    UpdateRating { song_id: i32, mark: i32 },
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix(UPDATE_RATING_PREFIX) {
            let (id, mark) = rest.split_once('_')?;
            let song_id = id.parse().ok()?;
            let mark = mark.parse().ok().filter(|m| (0..=MAX_MARK).contains(m))?;
            return Some(CallbackAction::UpdateRating { song_id, mark });
        }

        if let Some(id) = data.strip_prefix(EDIT_PREFIX) {
            return id.parse().ok().map(|song_id| CallbackAction::Edit { song_id });
        }

        None
    }

    pub fn to_data(self) -> String {
        match self {
            CallbackAction::Edit { song_id } => format!("{}{}", EDIT_PREFIX, song_id),
            CallbackAction::UpdateRating { song_id, mark } => {
                format!("{}{}_{}", UPDATE_RATING_PREFIX, song_id, mark)
            }
        }
    }
}

/// Handles presses on the rating keyboards.
///
/// Only the admin may rate; everyone else gets an alert.
pub async fn handle_rating_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> ResponseResult<()> {
    let callback_id = q.id.clone();
    let data = q.data.clone().unwrap_or_default();

    if !deps.admin.is_admin(q.from.username.as_deref()) {
        log::warn!("Rejected callback '{}' from non-admin user {}", data, q.from.id);
        bot.answer_callback_query(callback_id)
            .text(crate::telegram::admin::NO_ACCESS)
            .show_alert(true)
            .await?;
        return Ok(());
    }

    let Some(action) = CallbackAction::parse(&data) else {
        log::warn!("Unknown callback data: '{}'", data);
        bot.answer_callback_query(callback_id).await?;
        return Ok(());
    };

    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    let message_id = q.message.as_ref().map(|m| m.id());

    match action {
        CallbackAction::Edit { song_id } => {
            bot.answer_callback_query(callback_id).await?;
            let current = match deps.storage.get_song(song_id).await {
                Ok(song) => song.map(|s| s.mark),
                Err(e) => {
                    log::warn!("Failed to look up song {}: {}", song_id, e);
                    None
                }
            };
            if let (Some(chat_id), Some(message_id)) = (chat_id, message_id) {
                replace_keyboard(&bot, chat_id, message_id, song_id, current).await;
            }
        }
        CallbackAction::UpdateRating { song_id, mark } => {
            let (reply, saved) = match deps.storage.update_rating(song_id, mark).await {
                Ok(0) => (SONG_NOT_FOUND, false),
                Ok(_) => {
                    log::info!("Rating of song {} set to {}", song_id, mark);
                    (RATING_SAVED, true)
                }
                Err(e) => {
                    log::error!("Failed to update rating of song {}: {}", song_id, e);
                    (RATING_FAILED, false)
                }
            };

            bot.answer_callback_query(callback_id).text(reply).await?;
            if let Some(chat_id) = chat_id {
                bot.send_message(chat_id, reply).await?;
                if let (true, Some(message_id)) = (saved, message_id) {
                    replace_keyboard(&bot, chat_id, message_id, song_id, Some(mark)).await;
                }
            }
        }
    }

    Ok(())
}

async fn replace_keyboard(bot: &Bot, chat_id: ChatId, message_id: MessageId, song_id: i32, current: Option<i32>) {
    let result: Result<_, RequestError> = bot
        .edit_message_reply_markup(chat_id, message_id)
        .reply_markup(rating_keyboard(song_id, current))
        .await;
    if let Err(e) = result {
        log::warn!("Failed to update rating keyboard for song {}: {}", song_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_update_rating() {
        assert_eq!(
            CallbackAction::parse("update_rating_42_3"),
            Some(CallbackAction::UpdateRating { song_id: 42, mark: 3 })
        );
    }

    #[test]
    fn test_parse_edit() {
        assert_eq!(CallbackAction::parse("edit_42"), Some(CallbackAction::Edit { song_id: 42 }));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(CallbackAction::parse("update_rating_42"), None);
        assert_eq!(CallbackAction::parse("update_rating_x_3"), None);
        assert_eq!(CallbackAction::parse("update_rating_42_9"), None);
        assert_eq!(CallbackAction::parse("edit_"), None);
        assert_eq!(CallbackAction::parse("menu:back"), None);
    }

    #[test]
    fn test_data_matches_parse() {
        for action in [
            CallbackAction::Edit { song_id: 1 },
            CallbackAction::UpdateRating { song_id: 7, mark: 0 },
        ] {
            assert_eq!(CallbackAction::parse(&action.to_data()), Some(action));
        }
    }
}
