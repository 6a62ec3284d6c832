//! Integration tests for Telegram handlers using teloxide_tests
//!
//! These tests run the production dispatcher schema against `MockBot`, with
//! the in-process storage backend standing in for a database server.
//! Run with: cargo test --test handlers_integration_test

use serial_test::serial;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup, User};
use teloxide_tests::{MockBot, MockCallbackQuery, MockDocument, MockMessageDocument, MockMessageText, MockUser};

use repertuar_bot::storage::backup::{backup_path, list_backups};
use repertuar_bot::storage::{MemoryStorageManager, StorageManager};
use repertuar_bot::telegram::admin::{AdminIdentity, NO_ACCESS};
use repertuar_bot::telegram::conversation::SEPARATOR_NOT_ALLOWED;
use repertuar_bot::telegram::handlers::{
    added_reply, duplicate_reply, CSV_EXPECTED, CSV_TOO_LARGE, MAX_CSV_DOCUMENT_BYTES, NO_SONGS, REQUEST_THANKS,
};
use repertuar_bot::telegram::menu::{RANDOM_BUTTON, RATING_SAVED, REQUEST_BUTTON, SONG_NOT_FOUND};
use repertuar_bot::telegram::{schema, ConversationStore, HandlerDeps};

const ADMIN: &str = "maestro";

fn admin_user() -> User {
    MockUser::new().username(ADMIN).build()
}

fn listener() -> User {
    MockUser::new().username("listener").build()
}

fn admin_says(text: &str) -> MockMessageText {
    MockMessageText::new().text(text).from(admin_user())
}

fn listener_says(text: &str) -> MockMessageText {
    MockMessageText::new().text(text).from(listener())
}

fn create_test_deps(storage: Arc<MemoryStorageManager>, admin_chat: Option<i64>) -> HandlerDeps {
    create_test_deps_with_backups(storage, admin_chat, PathBuf::from("target/test-backups"))
}

fn create_test_deps_with_backups(
    storage: Arc<MemoryStorageManager>,
    admin_chat: Option<i64>,
    backup_dir: PathBuf,
) -> HandlerDeps {
    HandlerDeps::new(
        storage,
        ConversationStore::new(Duration::from_secs(60)),
        AdminIdentity::new(ADMIN, admin_chat),
        backup_dir,
    )
}

fn admin_sends_document(size: u32) -> MockMessageDocument {
    MockMessageDocument::new()
        .document(MockDocument::new().file_size(size).build())
        .from(admin_user())
}

/// Button labels of the single row of an inline keyboard
fn row_labels(markup: &InlineKeyboardMarkup) -> Vec<String> {
    markup.inline_keyboard[0].iter().map(|b| b.text.clone()).collect()
}

/// Texts of every message the bot sent, in order
macro_rules! sent_texts {
    ($bot:expr) => {
        $bot.get_responses()
            .sent_messages
            .iter()
            .filter_map(|m| m.text().map(str::to_string))
            .collect::<Vec<String>>()
    };
}

// ==================== /start and /help ====================

#[tokio::test]
#[serial]
async fn test_start_greets_listener() {
    let storage = Arc::new(MemoryStorageManager::new());
    let mut bot = MockBot::new(listener_says("/start"), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert_eq!(responses.sent_messages.len(), 1);
    let msg = &responses.sent_messages[0];
    assert!(msg.text().unwrap().contains("Привет"));
    assert!(!msg.text().unwrap().contains("/addcsv"), "admin commands are for the admin only");
}

#[tokio::test]
#[serial]
async fn test_start_lists_admin_commands_for_admin() {
    let storage = Arc::new(MemoryStorageManager::new());
    let mut bot = MockBot::new(admin_says("/start"), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("/addcsv"));
}

// ==================== admin gating ====================

#[tokio::test]
#[serial]
async fn test_admin_commands_are_denied_to_others() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![listener_says("/add"), listener_says("/addcsv"), listener_says("/backup")];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    assert_eq!(sent_texts!(bot), vec![NO_ACCESS, NO_ACCESS, NO_ACCESS]);
}

// ==================== /add conversation ====================

#[tokio::test]
#[serial]
async fn test_add_conversation_stores_song() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/add"),
        admin_says("Yesterday"),
        admin_says("The Beatles"),
        admin_says("rock, 60s"),
        admin_says("5"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(
        texts,
        vec![
            "Введите название музыкального произведения:".to_string(),
            "Введите исполнителя:".to_string(),
            "Введите теги через запятую:".to_string(),
            "Введите оценку от 0 до 5:".to_string(),
            added_reply("Yesterday"),
        ]
    );

    let songs = storage.songs().await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].artist, "The Beatles");
    assert_eq!(songs[0].tags, "rock, 60s");
    assert_eq!(songs[0].mark, 5);
}

#[tokio::test]
#[serial]
async fn test_add_duplicate_is_reported() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Yesterday", "The Beatles", "", 0).await;
    let updates = vec![
        admin_says("/add"),
        admin_says("Yesterday"),
        admin_says("The Beatles"),
        admin_says("rock"),
        admin_says("3"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.last(), Some(&duplicate_reply("Yesterday")));
    assert_eq!(storage.get_songs_count().await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_add_back_and_invalid_mark() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/add"),
        admin_says("Wrong title"),
        admin_says("Назад"),
        admin_says("Right title"),
        admin_says("Artist"),
        admin_says("tag"),
        admin_says("9"),
        admin_says("2"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts[2], "Введите название музыкального произведения:");
    assert_eq!(texts[6], "Оценка должна быть числом от 0 до 5.");
    assert_eq!(texts.last(), Some(&added_reply("Right title")));

    let songs = storage.songs().await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].title, "Right title");
    assert_eq!(songs[0].mark, 2);
}

#[tokio::test]
#[serial]
async fn test_add_rejects_field_separator() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/add"),
        admin_says("Title;with semi"),
        admin_says("Title with semi"),
        admin_says("Art;ist"),
        admin_says("Artist"),
        admin_says("a;b"),
        admin_says("a,b"),
        admin_says("2"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts[1], SEPARATOR_NOT_ALLOWED);
    assert_eq!(texts[3], SEPARATOR_NOT_ALLOWED);
    assert_eq!(texts[5], SEPARATOR_NOT_ALLOWED);
    assert_eq!(texts.last(), Some(&added_reply("Title with semi")));

    let songs = storage.songs().await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(
        (songs[0].title.as_str(), songs[0].artist.as_str(), songs[0].tags.as_str()),
        ("Title with semi", "Artist", "a,b")
    );
}

#[tokio::test]
#[serial]
async fn test_command_cancels_pending_step() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![admin_says("/add"), admin_says("/stats"), admin_says("Yesterday")];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    // Prompt, stats reply, and nothing for the orphaned title
    assert_eq!(texts.len(), 2);
    assert!(texts[1].contains("0 композиций"));
    assert_eq!(storage.get_songs_count().await.unwrap(), 0);
}

// ==================== /addcsv ====================

#[tokio::test]
#[serial]
async fn test_addcsv_imports_text() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/addcsv"),
        admin_says("A;B;x,y;3\nC;D\nbroken line\nA;B"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 2);
    assert!(texts[1].starts_with("Музыкальные композиции успешно добавлены (2 шт)"));
    assert!(texts[1].contains("Дубликатов - 1 шт"));
    assert!(texts[1].contains("Пропущено строк - 1 шт"));
    assert_eq!(storage.get_songs_count().await.unwrap(), 2);
}

#[tokio::test]
#[serial]
async fn test_addcsv_refuses_large_document() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/addcsv"),
        admin_sends_document(MAX_CSV_DOCUMENT_BYTES + 1),
        admin_says("A;B"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    // The refusal ends the conversation: the text after it is not imported
    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[1], CSV_TOO_LARGE);
    assert_eq!(storage.get_songs_count().await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_addcsv_accepts_document() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![
        admin_says("/addcsv"),
        admin_sends_document(64),
        admin_says("Late;Line"),
    ];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    // The document is taken as the CSV input and closes the conversation
    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 2);
    assert_ne!(texts[1], CSV_EXPECTED);
    assert_ne!(texts[1], CSV_TOO_LARGE);
    let songs = storage.songs().await.unwrap();
    assert!(songs.iter().all(|s| s.title != "Late"));
}

// ==================== /backup ====================

#[tokio::test]
#[serial]
async fn test_backup_sends_document_and_prunes() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "pop", 5).await;

    let dir = tempfile::tempdir().unwrap();
    let now = chrono::Utc::now();
    let oldest = backup_path(dir.path(), now - chrono::Duration::days(31));
    for days in 1..=31 {
        let old = backup_path(dir.path(), now - chrono::Duration::days(days));
        std::fs::write(&old, "Old;Song;;0\n").unwrap();
    }

    let deps = create_test_deps_with_backups(storage, None, dir.path().to_path_buf());
    let mut bot = MockBot::new(admin_says("/backup"), schema(deps));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert_eq!(responses.sent_messages_document.len(), 1);
    let caption = responses.sent_messages_document[0].message.caption().unwrap_or_default();
    assert!(caption.contains("1 композиций"), "unexpected caption: {}", caption);

    // 31 old files plus the new one, pruned to the newest 30
    let kept = list_backups(dir.path()).await.unwrap();
    assert_eq!(kept.len(), 30);
    assert!(!oldest.exists());
    let newest = std::fs::read_to_string(&kept[0].0).unwrap();
    assert_eq!(newest, "Imagine;John Lennon;pop;5\n");
}

// ==================== random, stats, tags ====================

#[tokio::test]
#[serial]
async fn test_random_on_empty_repertoire() {
    let storage = Arc::new(MemoryStorageManager::new());
    let mut bot = MockBot::new(listener_says("/random"), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    assert_eq!(sent_texts!(bot), vec![NO_SONGS]);
}

#[tokio::test]
#[serial]
async fn test_random_button_for_listener_has_no_keyboard() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 0).await;
    let mut bot = MockBot::new(listener_says(RANDOM_BUTTON), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert_eq!(responses.sent_messages.len(), 1);
    assert_eq!(responses.sent_messages[0].text(), Some("John Lennon - Imagine"));
    assert!(responses.sent_messages[0].reply_markup().is_none());
}

#[tokio::test]
#[serial]
async fn test_random_for_admin_has_edit_button() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 0).await;
    let mut bot = MockBot::new(admin_says("/random"), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    let msg = &responses.sent_messages[0];
    assert_eq!(msg.text(), Some("John Lennon - Imagine"));

    let markup = msg.reply_markup().expect("admin should get an inline keyboard");
    let button = &markup.inline_keyboard[0][0];
    assert!(matches!(&button.kind, InlineKeyboardButtonKind::CallbackData(data) if data == "edit_1"));
}

#[tokio::test]
#[serial]
async fn test_tags_command() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("One", "A", "rock, jazz", 0).await;
    storage.add_song("Two", "A", "jazz,blues ", 0).await;
    let mut bot = MockBot::new(listener_says("/tags"), schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].ends_with("blues, jazz, rock"));
}

// ==================== song requests ====================

#[tokio::test]
#[serial]
async fn test_song_request_is_forwarded_to_admin_chat() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![listener_says(REQUEST_BUTTON), listener_says("Bohemian Rhapsody")];
    let admin_chat = MockMessageText::new().build().chat.id.0;
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage, Some(admin_chat))));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 3);
    assert_eq!(texts[0], "Напишите, какую композицию вы хотите услышать:");
    assert!(texts[1].contains("Bohemian Rhapsody"));
    assert!(texts[1].contains("@listener"));
    assert_eq!(texts[2], REQUEST_THANKS);
}

#[tokio::test]
#[serial]
async fn test_song_request_without_admin_chat_is_still_thanked() {
    let storage = Arc::new(MemoryStorageManager::new());
    let updates = vec![listener_says(REQUEST_BUTTON), listener_says("Bohemian Rhapsody")];
    let mut bot = MockBot::new(updates, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let texts = sent_texts!(bot);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[1], REQUEST_THANKS);
}

// ==================== rating callbacks ====================

#[tokio::test]
#[serial]
async fn test_rating_callback_saves_mark() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 0).await;
    let callback = MockCallbackQuery::new().data("update_rating_1_4").from(admin_user());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert!(!responses.answered_callback_queries.is_empty());
    assert!(responses
        .sent_messages
        .iter()
        .any(|m| m.text() == Some(RATING_SAVED)));
    assert_eq!(storage.songs().await.unwrap()[0].mark, 4);
}

#[tokio::test]
#[serial]
async fn test_rating_callback_marks_new_rating() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 0).await;
    let callback = MockCallbackQuery::new().data("update_rating_1_3").from(admin_user());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert_eq!(responses.edited_messages_reply_markup.len(), 1);
    let markup = responses.edited_messages_reply_markup[0]
        .message
        .reply_markup()
        .expect("rating row should be re-rendered");
    assert_eq!(row_labels(markup), vec!["0", "1", "2", "✅ 3", "4", "5"]);
}

#[tokio::test]
#[serial]
async fn test_edit_callback_expands_rating_row() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 2).await;
    let callback = MockCallbackQuery::new().data("edit_1").from(admin_user());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert!(!responses.answered_callback_queries.is_empty());
    assert_eq!(responses.edited_messages_reply_markup.len(), 1);
    let markup = responses.edited_messages_reply_markup[0]
        .message
        .reply_markup()
        .expect("edit should show the rating row");

    // The stored mark is ticked, every button saves a mark for song 1
    assert_eq!(row_labels(markup), vec!["0", "1", "✅ 2", "3", "4", "5"]);
    let data: Vec<String> = markup.inline_keyboard[0]
        .iter()
        .filter_map(|b| match &b.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(data[0], "update_rating_1_0");
    assert_eq!(data[5], "update_rating_1_5");
}

#[tokio::test]
#[serial]
async fn test_rating_callback_for_missing_song() {
    let storage = Arc::new(MemoryStorageManager::new());
    let callback = MockCallbackQuery::new().data("update_rating_99_4").from(admin_user());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert!(!responses.answered_callback_queries.is_empty());
    assert!(responses
        .sent_messages
        .iter()
        .any(|m| m.text() == Some(SONG_NOT_FOUND)));
}

#[tokio::test]
#[serial]
async fn test_rating_callback_denied_to_others() {
    let storage = Arc::new(MemoryStorageManager::new());
    storage.add_song("Imagine", "John Lennon", "", 0).await;
    let callback = MockCallbackQuery::new().data("update_rating_1_4").from(listener());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage.clone(), None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert!(!responses.answered_callback_queries.is_empty());
    assert!(responses.sent_messages.is_empty());
    assert_eq!(storage.songs().await.unwrap()[0].mark, 0);
}

#[tokio::test]
#[serial]
async fn test_malformed_callback_is_answered() {
    let storage = Arc::new(MemoryStorageManager::new());
    let callback = MockCallbackQuery::new().data("update_rating_oops").from(admin_user());
    let mut bot = MockBot::new(callback, schema(create_test_deps(storage, None)));

    bot.dispatch().await;

    let responses = bot.get_responses();
    assert!(!responses.answered_callback_queries.is_empty());
    assert!(responses.sent_messages.is_empty());
}
