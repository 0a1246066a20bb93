//! End-to-end exchange tests against a mock backend
//!
//! Drives the full path (controller, HTTP client, stream decoder, response
//! assembler, session store) against wiremock-served `/chat` responses in
//! both supported shapes.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foliochat::client::HttpBackend;
use foliochat::config::{BackendConfig, ResponseMode};
use foliochat::controller::ChatController;
use foliochat::session::resolve_source;

fn backend_for(server: &MockServer, response_mode: ResponseMode) -> Arc<HttpBackend> {
    let config = BackendConfig {
        host: server.uri(),
        response_mode,
        timeout_seconds: 10,
    };
    Arc::new(HttpBackend::new(&config).unwrap())
}

fn controller_for(server: &MockServer, response_mode: ResponseMode) -> ChatController {
    ChatController::new(backend_for(server, response_mode), Duration::from_millis(0))
}

fn ndjson(records: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for record in records {
        body.push_str(&record.to_string());
        body.push('\n');
    }
    body
}

/// Successful streamed exchange: one session created and titled, user and
/// assistant messages present, sources attached.
#[tokio::test]
async fn test_streamed_exchange_end_to_end() {
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"type": "metadata", "sources": ["doc1.pdf"], "source_authors": {"doc1.pdf": "Ada"}}),
        json!({"type": "chunk", "content": "X is "}),
        json!({"type": "chunk", "content": "..."}),
        json!({
            "type": "complete",
            "sources": ["doc1.pdf"],
            "source_chunks": {
                "doc1.pdf": {
                    "author": null,
                    "chunks": [{"text": "X is defined as ...", "distance": 0.31}]
                }
            }
        }),
    ]);

    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_partial_json(json!({
            "message": "What is X?",
            "folder_name": "docs"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);

    let mut updates = Vec::new();
    let report = controller
        .send_message("What is X?", "docs", |content| {
            updates.push(content.to_string())
        })
        .await
        .unwrap();

    assert_eq!(report.message.content, "X is ...");
    assert_eq!(report.message.sources, vec!["doc1.pdf"]);
    assert_eq!(updates, vec!["X is ".to_string(), "X is ...".to_string()]);

    let store = controller.store();
    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    let session = store.active().unwrap();
    assert_eq!(session.title, "What is X?");
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].content, "What is X?");
    assert_eq!(session.messages[1].content, "X is ...");

    // Source inspection works off the committed message, with the
    // per-exchange author winning over the (absent) chunk-set author.
    let inspection = resolve_source(&session.messages[1], "doc1.pdf");
    assert_eq!(inspection.author, Some("Ada"));
    assert_eq!(inspection.chunks.unwrap()[0].text, "X is defined as ...");
}

/// An HTTP error status rolls the exchange back: the session keeps zero
/// messages and the surfaced error is non-empty.
#[tokio::test]
async fn test_http_error_status_rolls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);

    let err = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap_err();
    assert!(!err.to_string().is_empty());
    assert!(err.to_string().contains("500"));

    let store = controller.store();
    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.active().unwrap().messages.len(), 0);
}

/// A streamed error record aborts and rolls back even after content deltas.
#[tokio::test]
async fn test_streamed_error_record_rolls_back() {
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"type": "chunk", "content": "partial answer"}),
        json!({"type": "error", "error": "Error generating response: quota exceeded"}),
    ]);

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);

    let err = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));

    let store = controller.store();
    let store = store.read().unwrap();
    assert!(store.active().unwrap().messages.is_empty());
}

/// `complete` without a prior `metadata` finalizes with empty sources.
#[tokio::test]
async fn test_streamed_complete_without_metadata() {
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"type": "chunk", "content": "answer"}),
        json!({"type": "complete"}),
    ]);

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);
    let report = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap();

    assert_eq!(report.message.content, "answer");
    assert!(report.message.sources.is_empty());
}

/// Unrecognized records in the stream are skipped as noise.
#[tokio::test]
async fn test_streamed_noise_records_are_skipped() {
    let server = MockServer::start().await;

    let mut body = String::from("this line is not json\n\n");
    body.push_str(&ndjson(&[
        json!({"type": "chunk", "content": "clean"}),
        json!({"some": "unrelated object"}),
        json!({"type": "complete"}),
    ]));

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);
    let report = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap();

    assert_eq!(report.message.content, "clean");
}

/// The unary response shape commits a full message in one step.
#[tokio::test]
async fn test_unary_exchange_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "X is ...",
            "sources": ["doc1.pdf"],
            "all_available_sources": ["doc1.pdf", "doc2.pdf"],
            "source_authors": {"doc1.pdf": "Ada"},
            "source_chunks": {
                "doc1.pdf": {"author": "Chunk Author", "chunks": [{"text": "excerpt"}]}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Unary);
    let report = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap();

    assert_eq!(report.message.content, "X is ...");
    assert_eq!(report.message.sources, vec!["doc1.pdf"]);

    // Per-exchange author beats the author embedded in the chunk set.
    let inspection = resolve_source(&report.message, "doc1.pdf");
    assert_eq!(inspection.author, Some("Ada"));
}

/// A unary body with an error field rolls back like an error record.
#[tokio::test]
async fn test_unary_error_body_rolls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "No relevant information found in the folder for this question.",
            "response": null,
            "sources": []
        })))
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Unary);
    let err = controller
        .send_message("What is X?", "docs", |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No relevant information"));

    let store = controller.store();
    let store = store.read().unwrap();
    assert!(store.active().unwrap().messages.is_empty());
}

/// A second send on the same session is rejected while one is in flight;
/// exchanges on different sessions do not block each other.
#[tokio::test]
async fn test_concurrent_send_on_same_session_is_rejected() {
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"type": "chunk", "content": "slow answer"}),
        json!({"type": "complete"}),
    ]);

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let controller = Arc::new(controller_for(&server, ResponseMode::Streaming));

    let background = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .send_message("first question", "docs", |_| {})
                .await
        })
    };

    // Give the first exchange time to create the session and dispatch.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = controller
        .send_message("second question", "docs", |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already in flight"));

    let report = background.await.unwrap().unwrap();
    let store = controller.store();
    let store = store.read().unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(report.session_id).unwrap().messages.len(), 2);
}

/// Changing the folder mid-conversation starts a fresh session instead of
/// mutating the current one.
#[tokio::test]
async fn test_folder_change_starts_new_session() {
    let server = MockServer::start().await;

    let body = ndjson(&[
        json!({"type": "chunk", "content": "answer"}),
        json!({"type": "complete"}),
    ]);

    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(2)
        .mount(&server)
        .await;

    let controller = controller_for(&server, ResponseMode::Streaming);

    let first = controller
        .send_message("q1", "docs", |_| {})
        .await
        .unwrap();
    let second = controller
        .send_message("q2", "papers", |_| {})
        .await
        .unwrap();

    assert_ne!(first.session_id, second.session_id);
    let store = controller.store();
    let store = store.read().unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(first.session_id).unwrap().folder_name, "docs");
    assert_eq!(store.get(second.session_id).unwrap().folder_name, "papers");
}
