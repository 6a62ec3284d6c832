mod callback_router;
mod keyboards;
mod main_menu;

pub use callback_router::{handle_rating_callback, CallbackAction, RATING_FAILED, RATING_SAVED, SONG_NOT_FOUND};
pub use keyboards::{edit_keyboard, main_keyboard, rating_keyboard, RANDOM_BUTTON, REQUEST_BUTTON};
pub use main_menu::{help_text, show_main_menu};
