//! Admin functionality for the Telegram bot
//!
//! This module contains:
//! - Admin identity (username check, chat used for song requests)
//! - Repertoire backup command

use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::InputFile;

use crate::core::config;
use crate::core::config::admin::normalize_username;
use crate::storage::backup::{backup_path, cleanup_old_backups};
use crate::storage::StorageManager;
use crate::telegram::Bot;

/// Reply to anyone who is not the admin
pub const NO_ACCESS: &str = "У вас нет доступа к этой команде.";

/// Who the admin is and where to reach them.
///
/// The username comes from configuration. The chat is either configured or
/// learned from the last message the admin sent.
#[derive(Clone, Debug)]
pub struct AdminIdentity {
    username: String,
    configured_chat: Option<ChatId>,
    last_chat: Arc<AtomicI64>,
}

impl AdminIdentity {
    pub fn new(username: &str, configured_chat: Option<i64>) -> Self {
        Self {
            username: normalize_username(username),
            configured_chat: configured_chat.map(ChatId),
            last_chat: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Admin identity from ADMIN_USERNAME / ADMIN_CHAT_ID
    pub fn from_config() -> Self {
        Self::new(&config::admin::ADMIN_USERNAME, *config::admin::ADMIN_CHAT_ID)
    }

    /// Check if a Telegram username belongs to the admin
    ///
    /// An empty configured username denies everyone.
    pub fn is_admin(&self, username: Option<&str>) -> bool {
        if self.username.is_empty() {
            return false;
        }
        username.map(normalize_username).as_deref() == Some(self.username.as_str())
    }

    /// Remembers the chat the admin wrote from
    pub fn remember_chat(&self, chat_id: ChatId) {
        let previous = self.last_chat.swap(chat_id.0, Ordering::Relaxed);
        if previous != chat_id.0 {
            log::info!("Admin chat is now {}", chat_id);
        }
    }

    /// Chat that receives song requests, if known
    pub fn chat(&self) -> Option<ChatId> {
        self.configured_chat.or_else(|| match self.last_chat.load(Ordering::Relaxed) {
            0 => None,
            id => Some(ChatId(id)),
        })
    }
}

/// Handle /backup command: export the repertoire and send the file
///
/// # Arguments
/// * `bot` - Bot instance
/// * `chat_id` - Chat ID where to send response
/// * `storage` - Repertoire storage
/// * `backup_dir` - Directory for backup files
pub async fn handle_backup_command(
    bot: &Bot,
    chat_id: ChatId,
    storage: &dyn StorageManager,
    backup_dir: &Path,
) -> ResponseResult<()> {
    let path = backup_path(backup_dir, Utc::now());

    match storage.backup(&path).await {
        Ok(path) => {
            let count = storage.get_songs_count().await.unwrap_or_default();
            bot.send_document(chat_id, InputFile::file(&path))
                .caption(format!("✅ Бэкап создан: {} композиций", count))
                .await?;

            if let Err(e) = cleanup_old_backups(backup_dir, config::backup::MAX_BACKUPS).await {
                log::warn!("Failed to clean up old backups in {}: {}", backup_dir.display(), e);
            }
        }
        Err(e) => {
            log::error!("Backup to {} failed: {}", path.display(), e);
            bot.send_message(chat_id, format!("❌ Ошибка при создании бэкапа: {}", e))
                .await?;
        }
    }

    Ok(())
}
