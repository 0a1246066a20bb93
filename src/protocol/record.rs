//! Chat response record shapes
//!
//! The backend answers `/chat` either as a stream of newline-delimited JSON
//! records or as one JSON object. Streamed records carry a `type`
//! discriminant; request-validation failures additionally arrive as bare
//! `{"error": ...}` objects without one. Anything else on the wire is noise
//! and is skipped.

use crate::session::message::SourceDetail;
use serde::Deserialize;
use std::collections::HashMap;

/// One streamed protocol record
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamRecord {
    /// Announces the retrieved source labels and their authors ahead of the
    /// answer text
    Metadata {
        #[serde(default)]
        sources: Vec<String>,
        #[serde(default)]
        source_authors: HashMap<String, String>,
    },

    /// One content delta of the answer text
    Chunk {
        #[serde(default)]
        content: String,
    },

    /// Final record of an exchange: cited sources and their chunk sets
    Complete {
        #[serde(default)]
        sources: Vec<String>,
        #[serde(default)]
        source_chunks: HashMap<String, SourceDetail>,
    },

    /// Fatal error; aborts the exchange
    Error {
        #[serde(default)]
        error: String,
    },
}

/// Error record without a `type` discriminant
///
/// Emitted by the backend for request-validation failures and the
/// no-relevant-results case.
#[derive(Debug, Deserialize)]
struct BareError {
    error: String,
}

/// Parse one decoded line into a protocol record
///
/// Returns `None` for blank lines and for records that match neither the
/// tagged nor the bare-error shape; such lines are noise, not failures.
///
/// # Examples
///
/// ```
/// use foliochat::protocol::{parse_record, StreamRecord};
///
/// let record = parse_record(r#"{"type": "chunk", "content": "X is "}"#);
/// assert!(matches!(record, Some(StreamRecord::Chunk { .. })));
///
/// assert!(parse_record("not json").is_none());
/// assert!(parse_record("").is_none());
/// ```
pub fn parse_record(line: &str) -> Option<StreamRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(record) = serde_json::from_str::<StreamRecord>(line) {
        return Some(record);
    }
    if let Ok(bare) = serde_json::from_str::<BareError>(line) {
        return Some(StreamRecord::Error { error: bare.error });
    }

    tracing::debug!("skipping unrecognized record: {}", line);
    None
}

/// Unary `/chat` response body
///
/// The single-object alternative to the streamed record sequence. Fields the
/// core does not consume are ignored during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    /// Full answer text
    #[serde(default)]
    pub response: Option<String>,

    /// Cited source labels
    #[serde(default)]
    pub sources: Vec<String>,

    /// Source label -> chunk set and embedded author
    #[serde(default)]
    pub source_chunks: HashMap<String, SourceDetail>,

    /// Source label -> author for this exchange
    #[serde(default)]
    pub source_authors: HashMap<String, String>,

    /// Error text; when present the exchange failed
    #[serde(default)]
    pub error: Option<String>,
}
