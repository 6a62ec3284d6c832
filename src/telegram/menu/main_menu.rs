use indoc::indoc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::keyboards::main_keyboard;
use crate::telegram::bot::Command;
use crate::telegram::Bot;

const GREETING: &str = indoc! {"
    🎵 Привет! Я храню репертуар музыкальных композиций.

    Нажми «Случайная композиция», чтобы получить что-нибудь из репертуара, \
    или «Заказать композицию», чтобы попросить что-то новое."};

const ADMIN_COMMANDS: &str = indoc! {"
    Команды администратора:
    /add - добавить композицию
    /addcsv - добавить композиции из CSV (название;исполнитель;теги;оценка)
    /backup - выгрузить репертуар в файл"};

/// Greeting plus the persistent reply keyboard.
///
/// The admin also gets the list of admin commands.
pub async fn show_main_menu(bot: &Bot, chat_id: ChatId, is_admin: bool) -> ResponseResult<Message> {
    let text = if is_admin {
        format!("{}\n\n{}", GREETING, ADMIN_COMMANDS)
    } else {
        GREETING.to_string()
    };

    bot.send_message(chat_id, text).reply_markup(main_keyboard()).await
}

/// Command descriptions for /help
pub fn help_text() -> String {
    Command::descriptions().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_mentions_buttons() {
        assert!(GREETING.contains("Случайная композиция"));
        assert!(GREETING.contains("Заказать композицию"));
    }

    #[test]
    fn test_help_lists_commands() {
        let help = help_text();
        assert!(help.contains("/random"));
        assert!(help.contains("/cancel"));
    }
}
