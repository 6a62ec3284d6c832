use teloxide::types::{InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use super::callback_router::CallbackAction;
use crate::storage::MAX_MARK;
use crate::telegram::cb;

/// Reply-keyboard button that sends a random composition
pub const RANDOM_BUTTON: &str = "Случайная композиция";

/// Reply-keyboard button that starts a song request
pub const REQUEST_BUTTON: &str = "Заказать композицию";

/// Persistent keyboard shown after /start
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(RANDOM_BUTTON),
        KeyboardButton::new(REQUEST_BUTTON),
    ]])
    .resize_keyboard()
}

/// Single "rate" button attached to a random composition for the admin
pub fn edit_keyboard(song_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![cb("✏️ Оценить", CallbackAction::Edit { song_id }.to_data())]])
}

/// Row of marks 0..=5, with ✅ on `current` when it is known
pub fn rating_keyboard(song_id: i32, current: Option<i32>) -> InlineKeyboardMarkup {
    let row = (0..=MAX_MARK)
        .map(|mark| {
            let label = if current == Some(mark) {
                format!("✅ {}", mark)
            } else {
                mark.to_string()
            };
            cb(label, CallbackAction::UpdateRating { song_id, mark }.to_data())
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(vec![row])
}
