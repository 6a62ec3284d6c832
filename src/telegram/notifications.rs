use teloxide::prelude::*;

use crate::telegram::admin::AdminIdentity;
use crate::telegram::handlers::UserInfo;
use crate::telegram::Bot;

/// Text of a song request as the admin sees it
pub fn format_song_request(user: &UserInfo, request: &str) -> String {
    let who = match (&user.username, &user.first_name) {
        (Some(username), Some(first_name)) => format!("{} (@{})", first_name, username),
        (Some(username), None) => format!("@{}", username),
        (None, Some(first_name)) => first_name.clone(),
        (None, None) => format!("chat {}", user.chat_id),
    };
    format!("🎶 Заказ композиции от {}:\n\n{}", who, request.trim())
}

/// Sends a song request to the administrator.
///
/// Returns `false` when no admin chat is known or sending failed; the request
/// is logged either way.
pub async fn notify_admin_song_request(bot: &Bot, admin: &AdminIdentity, user: &UserInfo, request: &str) -> bool {
    log::info!("Song request from chat {}: {}", user.chat_id, request.trim());

    let Some(chat_id) = admin.chat() else {
        log::warn!("No admin chat known yet, song request from chat {} is only logged", user.chat_id);
        return false;
    };

    match bot.send_message(chat_id, format_song_request(user, request)).await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Failed to forward song request to admin chat {}: {}", chat_id, e);
            false
        }
    }
}
