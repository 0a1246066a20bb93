//! Response assembly
//!
//! Folds decoded protocol records into an in-progress [`MessageDraft`], one
//! record at a time, and reports what changed so the caller can re-render
//! after content deltas. Also converts the unary response shape into a
//! finalized message through the same draft type.

use crate::error::{FolioError, Result};
use crate::protocol::record::{parse_record, ChatCompletion, StreamRecord};
use crate::session::message::{Message, MessageDraft};

/// Effect of applying one record to the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Record was noise, a blank line, or arrived after completion
    Skipped,
    /// Source metadata was recorded; content unchanged
    Sources,
    /// Content grew; the in-progress message should be re-rendered
    Content,
    /// The completion record was applied; no further records are expected
    Completed,
}

/// Accumulates one assistant response from a record stream
///
/// Records may arrive in any interleaving of `metadata` and `chunk`, with
/// `complete` always last. A `complete` without prior `metadata` is valid
/// and yields whatever was accumulated (defaulting to no sources). Records
/// after `complete` are ignored.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    draft: MessageDraft,
    completed: bool,
}

impl ResponseAssembler {
    /// Create an assembler with an empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one decoded line and apply it
    ///
    /// Unrecognized lines are skipped. An error record aborts with
    /// [`FolioError::Protocol`].
    pub fn apply_line(&mut self, line: &str) -> Result<Applied> {
        match parse_record(line) {
            Some(record) => self.apply(record),
            None => Ok(Applied::Skipped),
        }
    }

    /// Apply one parsed record to the draft
    pub fn apply(&mut self, record: StreamRecord) -> Result<Applied> {
        if self.completed {
            return Ok(Applied::Skipped);
        }

        match record {
            StreamRecord::Metadata {
                sources,
                source_authors,
            } => {
                self.draft.apply_metadata(sources, source_authors);
                Ok(Applied::Sources)
            }
            StreamRecord::Chunk { content } => {
                self.draft.append_content(&content);
                Ok(Applied::Content)
            }
            StreamRecord::Complete {
                sources,
                source_chunks,
            } => {
                self.draft.apply_completion(sources, source_chunks);
                self.completed = true;
                Ok(Applied::Completed)
            }
            StreamRecord::Error { error } => Err(FolioError::Protocol(error).into()),
        }
    }

    /// Content accumulated so far
    pub fn content(&self) -> &str {
        self.draft.content()
    }

    /// Returns true once the completion record has been applied
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Consume the assembler and produce the immutable message
    ///
    /// Valid both after `complete` and after a clean end of stream without
    /// one; in the latter case the message carries whatever was accumulated.
    pub fn finalize(self) -> Message {
        self.draft.finalize()
    }
}

/// Convert a unary `/chat` response into a finalized message
///
/// An `error` field in the body is fatal, exactly like an error record in
/// the streamed shape.
pub fn assemble_unary(completion: ChatCompletion) -> Result<Message> {
    if let Some(error) = completion.error {
        return Err(FolioError::Protocol(error).into());
    }

    let mut draft = MessageDraft::new();
    draft.append_content(completion.response.as_deref().unwrap_or_default());
    draft.apply_metadata(completion.sources.clone(), completion.source_authors);
    draft.apply_completion(completion.sources, completion.source_chunks);
    Ok(draft.finalize())
}
