//! Command, keyboard-button and conversation step handlers

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::Document;

use super::types::{HandlerDeps, UserInfo};
use crate::core::csv_import::import_csv;
use crate::core::AppResult;
use crate::storage::AddSongOutcome;
use crate::telegram::admin::{handle_backup_command, NO_ACCESS};
use crate::telegram::bot::Command;
use crate::telegram::conversation::{advance, PendingStep, Transition};
use crate::telegram::menu::{edit_keyboard, help_text, show_main_menu, RANDOM_BUTTON, REQUEST_BUTTON};
use crate::telegram::notifications::notify_admin_song_request;
use crate::telegram::Bot;

pub const NO_SONGS: &str = "Нет композиций в базе данных";
pub const ADD_FAILED: &str = "Не удалось добавить композицию, смотрите логи";
pub const ADD_CANCELLED: &str = "Добавление отменено.";
pub const REQUEST_THANKS: &str = "Спасибо! Ваш заказ передан.";
const STORAGE_FAILED: &str = "Не удалось получить данные, смотрите логи";
const CANCELLED: &str = "Действие отменено.";
const NOTHING_TO_CANCEL: &str = "Нечего отменять.";
const NO_TAGS: &str = "Тегов пока нет";
pub const CSV_EXPECTED: &str = "Пришлите список композиций текстом или CSV-файлом.";
pub const CSV_DOWNLOAD_FAILED: &str = "Не удалось загрузить файл, смотрите логи";
pub const CSV_TOO_LARGE: &str = "Файл слишком большой";
const REQUEST_EXPECTED: &str = "Напишите название композиции текстом.";

/// Largest CSV document accepted by /addcsv
pub const MAX_CSV_DOCUMENT_BYTES: u32 = 1024 * 1024;

pub fn added_reply(title: &str) -> String {
    format!("Музыкальное произведение '{}' успешно добавлено!", title)
}

pub fn duplicate_reply(title: &str) -> String {
    format!("Музыкальное произведение '{}' уже есть в БД", title)
}

fn add_reply(outcome: AddSongOutcome, title: &str) -> String {
    match outcome {
        AddSongOutcome::Added => added_reply(title),
        AddSongOutcome::Duplicate => duplicate_reply(title),
        AddSongOutcome::DatabaseError | AddSongOutcome::OtherError => ADD_FAILED.to_string(),
    }
}

/// Runs a bot command. Any pending conversation step is dropped first.
pub async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let is_admin = deps.check_admin(msg);

    let pending = deps.conversations.cancel(chat_id).await;
    if let Some(step) = &pending {
        log::info!("Chat {}: pending {:?} cancelled by {:?}", chat_id, step, cmd);
    }

    if cmd.is_admin_only() && !is_admin {
        log::warn!("Chat {}: non-admin tried {:?}", chat_id, cmd);
        bot.send_message(chat_id, NO_ACCESS).await?;
        return Ok(());
    }

    match cmd {
        Command::Start => {
            show_main_menu(bot, chat_id, is_admin).await?;
        }
        Command::Help => {
            bot.send_message(chat_id, help_text()).await?;
        }
        Command::Add => start_step(bot, chat_id, deps, PendingStep::AddTitle).await?,
        Command::AddCsv => start_step(bot, chat_id, deps, PendingStep::CsvImport).await?,
        Command::Random => send_random_song(bot, chat_id, deps, is_admin).await?,
        Command::Stats => send_stats(bot, chat_id, deps).await?,
        Command::Tags => send_tags(bot, chat_id, deps).await?,
        Command::Backup => {
            handle_backup_command(bot, chat_id, deps.storage.as_ref(), &deps.backup_dir).await?;
        }
        Command::Cancel => {
            let reply = if pending.is_some() { CANCELLED } else { NOTHING_TO_CANCEL };
            bot.send_message(chat_id, reply).await?;
        }
    }

    Ok(())
}

/// Handles a plain message: reply-keyboard buttons, then the pending step.
pub async fn handle_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let chat_id = msg.chat.id;
    let is_admin = deps.check_admin(msg);

    // Keyboard buttons act like commands and interrupt any conversation
    match msg.text().map(str::trim) {
        Some(RANDOM_BUTTON) => {
            deps.conversations.cancel(chat_id).await;
            return send_random_song(bot, chat_id, deps, is_admin).await;
        }
        Some(REQUEST_BUTTON) => {
            return start_step(bot, chat_id, deps, PendingStep::SongRequest).await;
        }
        Some(text) if text.starts_with('/') => {
            if let Some(step) = deps.conversations.cancel(chat_id).await {
                log::info!("Chat {}: pending {:?} cancelled by unknown command {}", chat_id, step, text);
            }
            return Ok(());
        }
        _ => {}
    }

    match deps.conversations.get(chat_id).await {
        Some(step) => handle_pending_step(bot, msg, deps, step, is_admin).await,
        None => {
            log::debug!("Chat {}: ignoring message outside of a conversation", chat_id);
            Ok(())
        }
    }
}

async fn start_step(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, step: PendingStep) -> ResponseResult<()> {
    let prompt = step.prompt();
    deps.conversations.set(chat_id, step).await;
    bot.send_message(chat_id, prompt).await?;
    Ok(())
}

async fn handle_pending_step(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    step: PendingStep,
    is_admin: bool,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    if (step.is_add_flow() || step == PendingStep::CsvImport) && !is_admin {
        // Someone else wrote into a group chat where the admin started a flow
        log::warn!("Chat {}: non-admin message during {:?} ignored", chat_id, step);
        return Ok(());
    }

    match step {
        PendingStep::CsvImport => handle_csv_import(bot, msg, deps).await,
        PendingStep::SongRequest => {
            let Some(text) = msg.text().filter(|t| !t.trim().is_empty()) else {
                bot.send_message(chat_id, REQUEST_EXPECTED).await?;
                return Ok(());
            };
            deps.conversations.cancel(chat_id).await;
            let user = UserInfo::from_message(msg);
            notify_admin_song_request(bot, &deps.admin, &user, text).await;
            bot.send_message(chat_id, REQUEST_THANKS).await?;
            Ok(())
        }
        add_step => {
            let Some(text) = msg.text() else {
                bot.send_message(chat_id, add_step.prompt()).await?;
                return Ok(());
            };
            handle_add_step(bot, chat_id, deps, add_step, text).await
        }
    }
}

async fn handle_add_step(
    bot: &Bot,
    chat_id: ChatId,
    deps: &HandlerDeps,
    step: PendingStep,
    text: &str,
) -> ResponseResult<()> {
    match advance(step, text) {
        Transition::Ask(next) => start_step(bot, chat_id, deps, next).await?,
        Transition::Retry(step, reason) => {
            deps.conversations.set(chat_id, step).await;
            bot.send_message(chat_id, reason).await?;
        }
        Transition::Submit(song) => {
            deps.conversations.cancel(chat_id).await;
            let outcome = deps
                .storage
                .add_song(&song.title, &song.artist, &song.tags, song.mark)
                .await;
            log::info!(
                "Chat {}: add '{}' by '{}' -> {:?} (code {})",
                chat_id,
                song.title,
                song.artist,
                outcome,
                outcome.code()
            );
            bot.send_message(chat_id, add_reply(outcome, &song.title)).await?;
        }
        Transition::Exit => {
            deps.conversations.cancel(chat_id).await;
            bot.send_message(chat_id, ADD_CANCELLED).await?;
        }
    }
    Ok(())
}

async fn handle_csv_import(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let text = if let Some(text) = msg.text() {
        text.to_string()
    } else if let Some(document) = msg.document() {
        if document.file.size > MAX_CSV_DOCUMENT_BYTES {
            deps.conversations.cancel(chat_id).await;
            bot.send_message(chat_id, CSV_TOO_LARGE).await?;
            return Ok(());
        }
        match download_document(bot, document).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Chat {}: failed to download CSV document: {}", chat_id, e);
                deps.conversations.cancel(chat_id).await;
                bot.send_message(chat_id, CSV_DOWNLOAD_FAILED).await?;
                return Ok(());
            }
        }
    } else {
        bot.send_message(chat_id, CSV_EXPECTED).await?;
        return Ok(());
    };

    deps.conversations.cancel(chat_id).await;
    log::info!("Chat {}: received CSV with {} lines", chat_id, text.lines().count());
    let summary = import_csv(deps.storage.as_ref(), &text).await;
    bot.send_message(chat_id, summary.to_message()).await?;
    Ok(())
}

/// Downloads a document through the Bot API and decodes it as UTF-8
async fn download_document(bot: &Bot, document: &Document) -> AppResult<String> {
    let file = bot.get_file(document.file.id.clone()).await?;
    let mut buffer = Vec::with_capacity(file.size as usize);
    bot.download_file(&file.path, &mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

async fn send_random_song(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps, is_admin: bool) -> ResponseResult<()> {
    match deps.storage.get_random_song().await {
        Ok(Some(song)) => {
            let request = bot.send_message(chat_id, format!("{} - {}", song.artist, song.title));
            if is_admin {
                request.reply_markup(edit_keyboard(song.id)).await?;
            } else {
                request.await?;
            }
        }
        Ok(None) => {
            bot.send_message(chat_id, NO_SONGS).await?;
        }
        Err(e) => {
            log::error!("Failed to get a random song: {}", e);
            bot.send_message(chat_id, STORAGE_FAILED).await?;
        }
    }
    Ok(())
}

async fn send_stats(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> ResponseResult<()> {
    let reply = match deps.storage.get_songs_count().await {
        Ok(count) => format!("🎼 В репертуаре {} композиций", count),
        Err(e) => {
            log::error!("Failed to count songs: {}", e);
            STORAGE_FAILED.to_string()
        }
    };
    bot.send_message(chat_id, reply).await?;
    Ok(())
}

async fn send_tags(bot: &Bot, chat_id: ChatId, deps: &HandlerDeps) -> ResponseResult<()> {
    let reply = match deps.storage.get_tags().await {
        Ok(tags) if tags.is_empty() => NO_TAGS.to_string(),
        Ok(tags) => format!("🏷 Теги: {}", tags),
        Err(e) => {
            log::error!("Failed to list tags: {}", e);
            STORAGE_FAILED.to_string()
        }
    };
    bot.send_message(chat_id, reply).await?;
    Ok(())
}
