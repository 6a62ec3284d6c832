//! Bot initialization and command definitions
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command list registration in the Telegram UI

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "показывает главное меню")]
    Start,
    #[command(description = "список команд")]
    Help,
    #[command(description = "добавить композицию (только для администратора)")]
    Add,
    #[command(description = "добавить композиции из CSV (только для администратора)")]
    AddCsv,
    #[command(description = "случайная композиция")]
    Random,
    #[command(description = "количество композиций")]
    Stats,
    #[command(description = "все теги")]
    Tags,
    #[command(description = "создать бэкап репертуара (только для администратора)")]
    Backup,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

impl Command {
    /// Commands that only the admin may run
    pub fn is_admin_only(&self) -> bool {
        matches!(self, Command::Add | Command::AddCsv | Command::Backup)
    }
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid BOT_API_URL or HTTP client failure
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(config::BOT_TOKEN.as_str(), client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
///
/// Admin-only commands are left out: the command menu is shared by everyone.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "показывает главное меню"),
        BotCommand::new("help", "список команд"),
        BotCommand::new("random", "случайная композиция"),
        BotCommand::new("stats", "количество композиций"),
        BotCommand::new("tags", "все теги"),
        BotCommand::new("cancel", "отменить текущее действие"),
    ])
    .await?;

    Ok(())
}
