use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::time::sleep;

use repertuar_bot::cli::{Cli, Commands};
use repertuar_bot::core::{config, import_csv, init_logger, log_configuration};
use repertuar_bot::storage::backup::{backup_path, cleanup_old_backups};
use repertuar_bot::storage::{self, StorageManager};
use repertuar_bot::telegram::{create_bot, schema, setup_bot_commands, Bot, HandlerDeps};
use repertuar_bot::AppError;

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // Load environment variables from .env if present, before any config is read
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Backup { output }) => run_backup(output).await,
        Some(Commands::Import { file }) => run_import(file).await,
    }
}

/// Connects to the backend named by DATABASE_URL
async fn connect_storage() -> Result<Arc<dyn StorageManager>> {
    let database_url = config::DATABASE_URL
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;

    let storage = storage::connect(database_url).await.map_err(AppError::from)?;
    Ok(storage)
}

/// Run the backup command
async fn run_backup(output: Option<PathBuf>) -> Result<()> {
    let storage = connect_storage().await?;
    let backup_dir = PathBuf::from(config::BACKUP_DIR.as_str());

    let result = match output {
        Some(path) => storage.backup(&path).await,
        None => {
            let written = storage.backup(&backup_path(&backup_dir, chrono::Utc::now())).await;
            if written.is_ok() {
                cleanup_old_backups(&backup_dir, config::backup::MAX_BACKUPS).await?;
            }
            written
        }
    };
    storage.close().await;

    let path = result?;
    println!("{}", path.display());
    Ok(())
}

/// Run the import command
async fn run_import(file: PathBuf) -> Result<()> {
    let bytes = fs_err::tokio::read(&file).await?;
    let text = String::from_utf8_lossy(&bytes);

    let storage = connect_storage().await?;
    let summary = import_csv(storage.as_ref(), &text).await;
    storage.close().await;

    log::info!("Import of {} finished: {:?}", file.display(), summary);
    println!("{}", summary.to_message());
    Ok(())
}

/// Waits until the Bot API answers, retrying while it is still starting
async fn wait_for_bot_api(bot: &Bot) -> Result<teloxide::types::Me> {
    let max_retries = config::retry::STARTUP_MAX_RETRIES;
    let mut attempt = 0;

    loop {
        match bot.get_me().await {
            Ok(me) => return Ok(me),
            Err(e) => {
                let err_str = e.to_string();
                let is_retryable = err_str.contains("restart")
                    || err_str.contains("network")
                    || err_str.contains("connection")
                    || err_str.contains("timed out");

                attempt += 1;
                if attempt >= max_retries || !is_retryable {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to Bot API after {} attempts: {}",
                        attempt,
                        e
                    ));
                }

                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt,
                    max_retries,
                    err_str,
                    config::retry::startup_delay()
                );
                sleep(config::retry::startup_delay()).await;
            }
        }
    }
}

/// Run the Telegram bot
async fn run_bot() -> Result<()> {
    log::info!("Starting bot...");
    log_configuration();

    let bot = create_bot()?;
    let storage = connect_storage().await?;

    let me = wait_for_bot_api(&bot).await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::from_config(Arc::clone(&storage));

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    storage.close().await;
    Ok(())
}
