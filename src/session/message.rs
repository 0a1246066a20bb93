//! Message and chunk data model
//!
//! Messages follow a two-phase lifecycle: while a response is streaming in,
//! content accumulates in a [`MessageDraft`]; once the exchange finishes the
//! draft is converted into an immutable [`Message`] exactly once. Chunks and
//! their metadata are read-only snapshots received from the backend and are
//! never created or edited on this side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Role of a message within a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message typed by the user
    User,
    /// A message produced by the assistant
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Positional metadata attached to a retrieved chunk
///
/// All fields are optional; the backend only sets the ones it knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Document title the chunk came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Original filename of the ingested document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Folder the document was ingested into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,

    /// Index of this chunk within the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,

    /// Total number of chunks the document was split into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
}

/// A retrieved excerpt of source text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The excerpt text
    pub text: String,

    /// Similarity distance reported by the retrieval layer (lower is closer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,

    /// Positional metadata, when the backend provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkMetadata>,
}

/// Chunk set and authorship for one source label
///
/// Mirrors the backend's per-source `source_chunks` entry verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDetail {
    /// Author embedded in the chunk-set entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Chunks backing this source
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

/// A finalized, immutable conversation message
///
/// The source fields are only populated on assistant messages; user messages
/// carry empty collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    pub role: Role,

    /// Message text
    pub content: String,

    /// When the message was created (user) or finalized (assistant)
    pub timestamp: DateTime<Utc>,

    /// Citation labels referenced by the answer, in citation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Source label -> chunk set and embedded author
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_chunks: HashMap<String, SourceDetail>,

    /// Source label -> author, as reported per exchange
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub source_authors: HashMap<String, String>,
}

impl Message {
    /// Create a user message with the current timestamp
    ///
    /// # Examples
    ///
    /// ```
    /// use foliochat::session::{Message, Role};
    ///
    /// let message = Message::user("What is X?");
    /// assert_eq!(message.role, Role::User);
    /// assert!(message.sources.is_empty());
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            source_chunks: HashMap::new(),
            source_authors: HashMap::new(),
        }
    }

    /// Create a plain assistant message without source data
    ///
    /// Used for the in-progress placeholder that is shown while a response
    /// is still streaming.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
            source_chunks: HashMap::new(),
            source_authors: HashMap::new(),
        }
    }

    /// Returns true if this is an assistant message
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Returns true if the message cites at least one source
    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Mutable accumulator for an in-progress assistant message
///
/// Content deltas and source metadata are folded in while the response
/// streams; [`MessageDraft::finalize`] consumes the draft and produces the
/// immutable [`Message`]. There is no way back from a finalized message to
/// a draft.
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    content: String,
    sources: Vec<String>,
    source_chunks: HashMap<String, SourceDetail>,
    source_authors: HashMap<String, String>,
}

impl MessageDraft {
    /// Create an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a content delta to the accumulated text
    pub fn append_content(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Record the source list and per-exchange author map
    ///
    /// Sent by the backend ahead of the content; does not touch content.
    pub fn apply_metadata(&mut self, sources: Vec<String>, authors: HashMap<String, String>) {
        self.sources = sources;
        self.source_authors = authors;
    }

    /// Record the final cited-source list and per-source chunk sets
    pub fn apply_completion(&mut self, sources: Vec<String>, chunks: HashMap<String, SourceDetail>) {
        self.sources = sources;
        self.source_chunks = chunks;
    }

    /// The content accumulated so far
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true if no content has been accumulated yet
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Consume the draft and produce the immutable assistant message
    pub fn finalize(self) -> Message {
        Message {
            role: Role::Assistant,
            content: self.content,
            timestamp: Utc::now(),
            sources: self.sources,
            source_chunks: self.source_chunks,
            source_authors: self.source_authors,
        }
    }
}
