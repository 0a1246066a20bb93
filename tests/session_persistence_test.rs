//! Integration tests for session persistence
//!
//! Round-trips sessions through the sqlite store and verifies that the
//! in-memory session store rebuilds correctly from persisted state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tempfile::tempdir;
use uuid::Uuid;

use foliochat::session::{Message, Session, SessionStore};
use foliochat::storage::SqliteStorage;

fn session(folder: &str, title: &str, messages: Vec<Message>) -> Session {
    Session {
        id: Uuid::new_v4(),
        folder_name: folder.to_string(),
        title: title.to_string(),
        created_at: Utc::now(),
        messages,
    }
}

#[test]
fn test_roundtrip_preserves_sources() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();

    let mut answer = Message::assistant("X is ... [doc1.pdf]");
    answer.sources = vec!["doc1.pdf".to_string()];
    answer
        .source_authors
        .insert("doc1.pdf".to_string(), "Ada".to_string());

    let saved = session(
        "docs",
        "What is X?",
        vec![Message::user("What is X?"), answer],
    );
    storage.save_session(&saved).unwrap();

    let loaded = storage.load_sessions().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].messages, saved.messages);
    assert_eq!(
        loaded[0].messages[1].source_authors.get("doc1.pdf").unwrap(),
        "Ada"
    );
}

#[test]
fn test_store_rebuilds_from_persisted_sessions() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();

    let mut older = session("docs", "first chat", vec![Message::user("q1")]);
    older.created_at = Utc::now() - chrono::Duration::hours(1);
    let newer = session("papers", "second chat", vec![Message::user("q2")]);

    storage.save_session(&newer).unwrap();
    storage.save_session(&older).unwrap();

    let mut store = SessionStore::new();
    for loaded in storage.load_sessions().unwrap() {
        store.restore(loaded);
    }

    assert_eq!(store.len(), 2);
    // Nothing is active until the user picks or starts a conversation.
    assert_eq!(store.active_id(), None);
    // Display order reflects creation order, newest first.
    let titles: Vec<&str> = store
        .sessions_newest_first()
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["second chat", "first chat"]);
}

#[test]
fn test_delete_persisted_session() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();

    let keep = session("docs", "keep", Vec::new());
    let drop = session("docs", "drop", Vec::new());
    storage.save_session(&keep).unwrap();
    storage.save_session(&drop).unwrap();

    storage.delete_session(&drop.id.to_string()).unwrap();

    let remaining = storage.load_sessions().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
}

#[test]
fn test_list_sessions_orders_by_last_update() {
    let dir = tempdir().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();

    let first = session("docs", "first", Vec::new());
    let second = session("docs", "second", vec![Message::user("hi")]);
    storage.save_session(&first).unwrap();
    storage.save_session(&second).unwrap();

    // Touch the first session again so it becomes the most recent.
    storage.save_session(&first).unwrap();

    let listed = storage.list_sessions().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id.to_string());
}

/// The persisted-then-restored store behaves like a live one for a
/// subsequent exchange: the active pointer and message sequences are
/// shared through the same store handle the controller uses.
#[tokio::test]
async fn test_restored_store_shared_with_controller() {
    use async_trait::async_trait;
    use foliochat::client::{ChatBackend, ChatBody, ChatRequest};
    use foliochat::controller::ChatController;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send_chat(&self, request: &ChatRequest) -> foliochat::Result<ChatBody> {
            let body = format!(
                "{}\n{}\n",
                serde_json::json!({"type": "chunk", "content": format!("echo: {}", request.message)}),
                serde_json::json!({"type": "complete"}),
            );
            let bytes = bytes::Bytes::from(body);
            Ok(ChatBody::Streamed(Box::pin(futures::stream::iter(vec![
                Ok(bytes),
            ]))))
        }
    }

    let dir = tempdir().unwrap();
    let storage = SqliteStorage::new_with_path(dir.path().join("sessions.db")).unwrap();
    let saved = session("docs", "restored chat", vec![Message::user("old question")]);
    storage.save_session(&saved).unwrap();

    let store = Arc::new(RwLock::new(SessionStore::new()));
    {
        let mut guard = store.write().unwrap();
        for loaded in storage.load_sessions().unwrap() {
            guard.restore(loaded);
        }
        assert!(guard.switch_active(saved.id));
    }

    let controller = ChatController::with_store(
        Arc::new(EchoBackend),
        Arc::clone(&store),
        Duration::from_millis(0),
    );
    let report = controller
        .send_message("new question", "docs", |_| {})
        .await
        .unwrap();

    // The exchange landed in the restored session, not a new one.
    assert_eq!(report.session_id, saved.id);
    let guard = store.read().unwrap();
    assert_eq!(guard.len(), 1);
    assert_eq!(guard.get(saved.id).unwrap().messages.len(), 3);
    assert_eq!(
        guard.get(saved.id).unwrap().messages[2].content,
        "echo: new question"
    );
}
