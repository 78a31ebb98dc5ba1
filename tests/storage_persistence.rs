//! Integration tests for durable chat storage
//!
//! Covers the environment-variable database override and persistence
//! across storage instances, the way a restarted process would see the
//! data.

use deskmind::session::ExchangeMetadata;
use deskmind::storage::{ChatStorage, MessageRole};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_override_controls_database_location() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("override.db");
    std::env::set_var("DESKMIND_CHATS_DB", &db_path);

    let storage = ChatStorage::new().unwrap();
    storage.create_chat("alex", "via override").unwrap();

    std::env::remove_var("DESKMIND_CHATS_DB");

    assert!(db_path.exists());

    // Reopening the same path sees the chat
    let reopened = ChatStorage::new_with_path(&db_path).unwrap();
    let chats = reopened.user_chats("alex").unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].title, "via override");
}

#[test]
fn test_chats_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("chats.db");

    let chat_id = {
        let storage = ChatStorage::new_with_path(&db_path).unwrap();
        let chat = storage.create_chat("alex", "outage report").unwrap();
        storage
            .add_message(&chat.id, MessageRole::User, "What happened?", None)
            .unwrap();
        storage
            .add_message(
                &chat.id,
                MessageRole::Assistant,
                "Switch firmware bug, see INC-1042.",
                Some(ExchangeMetadata {
                    assistant_id: Some("asst_1".to_string()),
                    thread_id: Some("thread_1".to_string()),
                    run_id: Some("run_1".to_string()),
                }),
            )
            .unwrap();
        chat.id
    };

    let storage = ChatStorage::new_with_path(&db_path).unwrap();
    let messages = storage.chat_messages(&chat_id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(
        messages[1].metadata.as_ref().unwrap().thread_id.as_deref(),
        Some("thread_1")
    );
}

#[test]
fn test_deleting_one_chat_leaves_others() {
    let dir = TempDir::new().unwrap();
    let storage = ChatStorage::new_with_path(dir.path().join("chats.db")).unwrap();

    let keep = storage.create_chat("alex", "keep").unwrap();
    let discard = storage.create_chat("alex", "discard").unwrap();
    storage
        .add_message(&keep.id, MessageRole::User, "kept message", None)
        .unwrap();
    storage
        .add_message(&discard.id, MessageRole::User, "discarded message", None)
        .unwrap();

    storage.delete_chat(&discard.id).unwrap();

    let chats = storage.user_chats("alex").unwrap();
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0].title, "keep");
    assert_eq!(storage.chat_messages(&keep.id).unwrap().len(), 1);
    assert!(storage.chat_messages(&discard.id).unwrap().is_empty());
}
