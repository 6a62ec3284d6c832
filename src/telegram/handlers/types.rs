//! Handler types and dependencies

use std::path::PathBuf;
use std::sync::Arc;

use teloxide::types::Message;

use crate::core::config;
use crate::storage::StorageManager;
use crate::telegram::admin::AdminIdentity;
use crate::telegram::conversation::ConversationStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub storage: Arc<dyn StorageManager>,
    pub conversations: ConversationStore,
    pub admin: AdminIdentity,
    pub backup_dir: PathBuf,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        storage: Arc<dyn StorageManager>,
        conversations: ConversationStore,
        admin: AdminIdentity,
        backup_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            conversations,
            admin,
            backup_dir,
        }
    }

    /// Dependencies wired from environment configuration
    pub fn from_config(storage: Arc<dyn StorageManager>) -> Self {
        Self::new(
            storage,
            ConversationStore::default(),
            AdminIdentity::from_config(),
            PathBuf::from(config::BACKUP_DIR.as_str()),
        )
    }

    /// Whether the message was sent by the admin; remembers the admin's chat
    pub fn check_admin(&self, msg: &Message) -> bool {
        let username = msg.from.as_ref().and_then(|u| u.username.as_deref());
        let is_admin = self.admin.is_admin(username);
        if is_admin {
            self.admin.remember_chat(msg.chat.id);
        }
        is_admin
    }
}

/// Sender info for song requests
#[derive(Clone, Debug)]
pub struct UserInfo {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl UserInfo {
    /// Extract user info from a Telegram message
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            username: msg.from.as_ref().and_then(|u| u.username.clone()),
            first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
        }
    }
}
