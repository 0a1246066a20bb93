//! Session data model, ownership store, and source resolution
//!
//! This module contains the conversation state the rest of the application
//! reads: message and chunk types, the session store that owns them, and the
//! pure lookup that maps a citation label to its backing chunks.

pub mod message;
pub mod sources;
pub mod store;

pub use message::{Chunk, ChunkMetadata, Message, MessageDraft, Role, SourceDetail};
pub use sources::{resolve_source, SourceInspection};
pub use store::{Session, SessionId, SessionStore, TITLE_MAX_CHARS};
