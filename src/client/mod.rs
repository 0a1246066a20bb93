//! Backend collaborator interface
//!
//! The chat backend is an external collaborator reached over HTTP. This
//! module defines the request types, the `ChatBackend` trait the controller
//! depends on, and the `reqwest`-based implementation. Keeping the trait at
//! this seam lets tests drive the controller with scripted responses.

pub mod http;

pub use http::HttpBackend;

use crate::error::Result;
use crate::protocol::record::ChatCompletion;
use crate::session::message::Role;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

/// Raw response-body stream from the transport
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// One prior turn sent as conversation history
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Role of the original message
    pub role: Role,
    /// Message text
    pub content: String,
}

/// Request payload for `/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// The user's question, already trimmed
    pub message: String,
    /// Backend folder to answer from
    pub folder_name: String,
    /// Prior messages of the session, oldest first, excluding `message`
    pub conversation_history: Vec<HistoryEntry>,
}

/// A `/chat` response body in one of the two supported shapes
pub enum ChatBody {
    /// Newline-delimited JSON records, decoded incrementally
    Streamed(ByteStream),
    /// One JSON object carrying the whole answer
    Unary(ChatCompletion),
}

/// Chat backend collaborator
///
/// Implementations perform the `/chat` request and hand back the response
/// body without interpreting it; decoding and interpretation belong to the
/// protocol layer driven by the controller.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one chat request and return its response body
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-success HTTP status.
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatBody>;
}

/// Receipt returned by the document-ingestion endpoints
#[derive(Debug, Clone, serde::Deserialize)]
pub struct IngestReceipt {
    /// Folder the document landed in
    #[serde(default)]
    pub folder_name: Option<String>,

    /// Title extracted by the backend
    #[serde(default)]
    pub document_title: Option<String>,

    /// Author extracted by the backend
    #[serde(default)]
    pub document_author: Option<String>,

    /// Number of chunks the document was split into
    #[serde(default)]
    pub total_chunks: Option<usize>,

    /// Error text; when present the ingestion failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `/generate-outline`
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OutlineBatch {
    /// One entry per requested question
    #[serde(default)]
    pub outlines: Vec<OutlineEntry>,

    /// Batch-level error text
    #[serde(default)]
    pub error: Option<String>,
}

/// Outline result for one question
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OutlineEntry {
    /// The question the outline answers
    pub question: String,

    /// Generated outline text
    #[serde(default)]
    pub outline: Option<String>,

    /// Number of chunks consulted
    #[serde(default)]
    pub chunks_used: Option<usize>,

    /// Per-question error text
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_history_roles_lowercase() {
        let request = ChatRequest {
            message: "What is X?".to_string(),
            folder_name: "docs".to_string(),
            conversation_history: vec![
                HistoryEntry {
                    role: Role::User,
                    content: "earlier question".to_string(),
                },
                HistoryEntry {
                    role: Role::Assistant,
                    content: "earlier answer".to_string(),
                },
            ],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "What is X?");
        assert_eq!(json["folder_name"], "docs");
        assert_eq!(json["conversation_history"][0]["role"], "user");
        assert_eq!(json["conversation_history"][1]["role"], "assistant");
    }

    #[test]
    fn test_ingest_receipt_parses_backend_shape() {
        let json = r#"{
            "folder_name": "docs",
            "document_title": "Paper Title",
            "document_author": "Ada",
            "total_chunks": 12
        }"#;
        let receipt: IngestReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.folder_name.as_deref(), Some("docs"));
        assert_eq!(receipt.total_chunks, Some(12));
        assert!(receipt.error.is_none());
    }

    #[test]
    fn test_outline_batch_parses_mixed_results() {
        let json = r#"{
            "outlines": [
                {"question": "q1", "outline": "I. ...", "chunks_used": 40},
                {"question": "q2", "error": "no chunks found"}
            ]
        }"#;
        let batch: OutlineBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.outlines.len(), 2);
        assert!(batch.outlines[0].outline.is_some());
        assert!(batch.outlines[1].error.is_some());
    }
}
