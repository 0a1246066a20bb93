//! Source label resolution for finalized assistant messages
//!
//! Maps a citation label the user selected to the chunk set and best-known
//! author for inspection. Resolution is a pure lookup over data already
//! attached to the message; it performs no network access and signals
//! missing data through `None` rather than errors.

use crate::session::message::{Chunk, Message};

/// Result of resolving one source label on a message
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInspection<'a> {
    /// Chunks backing the label, or `None` when no chunk data is available
    pub chunks: Option<&'a [Chunk]>,

    /// Best-known author, or `None` when unknown
    pub author: Option<&'a str>,
}

impl SourceInspection<'_> {
    /// Returns true if chunk data is available for inspection
    pub fn is_available(&self) -> bool {
        self.chunks.is_some()
    }
}

/// Resolve a source label on a finalized assistant message
///
/// Author precedence: the per-exchange source→author map wins; the author
/// embedded in the per-source chunk-set entry is the fallback; otherwise the
/// author is unknown.
///
/// # Examples
///
/// ```
/// use foliochat::session::{resolve_source, Message};
///
/// let message = Message::assistant("no citations here");
/// let inspection = resolve_source(&message, "doc1.pdf");
/// assert!(!inspection.is_available());
/// assert!(inspection.author.is_none());
/// ```
pub fn resolve_source<'a>(message: &'a Message, label: &str) -> SourceInspection<'a> {
    let detail = message.source_chunks.get(label);
    let author = message
        .source_authors
        .get(label)
        .map(String::as_str)
        .or_else(|| detail.and_then(|d| d.author.as_deref()));

    SourceInspection {
        chunks: detail.map(|d| d.chunks.as_slice()),
        author,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::{Chunk, MessageDraft, SourceDetail};
    use std::collections::HashMap;

    fn message_with(
        authors: HashMap<String, String>,
        chunks: HashMap<String, SourceDetail>,
    ) -> Message {
        let mut draft = MessageDraft::new();
        draft.append_content("answer [doc1.pdf]");
        draft.apply_metadata(vec!["doc1.pdf".to_string()], authors);
        draft.apply_completion(vec!["doc1.pdf".to_string()], chunks);
        draft.finalize()
    }

    fn detail(author: Option<&str>) -> SourceDetail {
        SourceDetail {
            author: author.map(str::to_string),
            chunks: vec![Chunk {
                text: "excerpt".to_string(),
                distance: Some(0.2),
                metadata: None,
            }],
        }
    }

    #[test]
    fn test_per_exchange_author_wins() {
        let message = message_with(
            HashMap::from([("doc1.pdf".to_string(), "Exchange Author".to_string())]),
            HashMap::from([("doc1.pdf".to_string(), detail(Some("Chunk Author")))]),
        );

        let inspection = resolve_source(&message, "doc1.pdf");
        assert_eq!(inspection.author, Some("Exchange Author"));
        assert!(inspection.is_available());
    }

    #[test]
    fn test_chunk_author_is_fallback() {
        let message = message_with(
            HashMap::new(),
            HashMap::from([("doc1.pdf".to_string(), detail(Some("Chunk Author")))]),
        );

        let inspection = resolve_source(&message, "doc1.pdf");
        assert_eq!(inspection.author, Some("Chunk Author"));
    }

    #[test]
    fn test_author_unknown_when_both_absent() {
        let message = message_with(
            HashMap::new(),
            HashMap::from([("doc1.pdf".to_string(), detail(None))]),
        );

        let inspection = resolve_source(&message, "doc1.pdf");
        assert_eq!(inspection.author, None);
        assert!(inspection.is_available());
    }

    #[test]
    fn test_unknown_label_is_unavailable() {
        let message = message_with(HashMap::new(), HashMap::new());

        let inspection = resolve_source(&message, "missing.pdf");
        assert!(!inspection.is_available());
        assert_eq!(inspection.author, None);
    }

    #[test]
    fn test_author_known_without_chunks() {
        // Metadata announced an author but the completion carried no chunk
        // data for the label: author resolves, chunks stay unavailable.
        let message = message_with(
            HashMap::from([("doc1.pdf".to_string(), "Ada".to_string())]),
            HashMap::new(),
        );

        let inspection = resolve_source(&message, "doc1.pdf");
        assert!(!inspection.is_available());
        assert_eq!(inspection.author, Some("Ada"));
    }

    #[test]
    fn test_resolved_chunks_match_message_data() {
        let message = message_with(
            HashMap::new(),
            HashMap::from([("doc1.pdf".to_string(), detail(None))]),
        );

        let inspection = resolve_source(&message, "doc1.pdf");
        let chunks = inspection.chunks.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "excerpt");
    }
}
