//! Session ownership table and active-session pointer
//!
//! The store owns every conversation session and is the single writer of
//! session data: the controller and the UI mutate sessions only through the
//! operations defined here. Sessions live in a map keyed by id plus a
//! creation-order list; the active session is a separate nullable id rather
//! than a flag on the session records.

use crate::session::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque session identifier
pub type SessionId = Uuid;

/// Maximum number of characters in a session title before truncation
pub const TITLE_MAX_CHARS: usize = 50;

/// One independent conversation thread bound to a document folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Backend folder this session's messages target
    pub folder_name: String,

    /// Display title, derived from the folder name until the first
    /// exchange retitles it from the user's question
    pub title: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Ordered message history
    pub messages: Vec<Message>,
}

/// Owner of all sessions and the active-session pointer
///
/// Invariants maintained by the operations below:
/// - at most one session is active at a time;
/// - message sequences are swapped whole, never partially mutated from
///   outside;
/// - deleting the active session activates the most-recently-created
///   remaining session (the first one in display order), or clears the
///   pointer when no sessions remain.
///
/// # Examples
///
/// ```
/// use foliochat::session::SessionStore;
///
/// let mut store = SessionStore::new();
/// let id = store.create_session("docs");
/// assert_eq!(store.active_id(), Some(id));
/// assert!(store.delete_session(id));
/// assert_eq!(store.active_id(), None);
/// ```
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    /// Creation order, oldest first
    order: Vec<SessionId>,
    active: Option<SessionId>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session bound to `folder_name` and make it active
    ///
    /// Always succeeds. The initial title is the (truncated) folder name.
    pub fn create_session(&mut self, folder_name: &str) -> SessionId {
        let id = Uuid::new_v4();
        let session = Session {
            id,
            folder_name: folder_name.to_string(),
            title: truncate_title(folder_name),
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        self.sessions.insert(id, session);
        self.order.push(id);
        self.active = Some(id);
        tracing::debug!(session_id = %id, folder = folder_name, "created session");
        id
    }

    /// Re-insert a session loaded from persistence
    ///
    /// Keeps the session's own id and timestamps and does not touch the
    /// active pointer. A session whose id is already present is ignored.
    pub fn restore(&mut self, session: Session) {
        if self.sessions.contains_key(&session.id) {
            return;
        }
        self.order.push(session.id);
        self.sessions.insert(session.id, session);
    }

    /// Make `id` the active session
    ///
    /// Returns false (and changes nothing) if the id is unknown.
    pub fn switch_active(&mut self, id: SessionId) -> bool {
        if !self.sessions.contains_key(&id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Remove a session
    ///
    /// If it was the active session, the most-recently-created remaining
    /// session becomes active, or the active pointer is cleared when none
    /// remain. Returns false if the id is unknown.
    pub fn delete_session(&mut self, id: SessionId) -> bool {
        if self.sessions.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|other| *other != id);
        if self.active == Some(id) {
            self.active = self.order.last().copied();
        }
        tracing::debug!(session_id = %id, "deleted session");
        true
    }

    /// Replace a session's entire message sequence with a new one
    ///
    /// The sequence is treated as one value per update: observers see either
    /// the previous sequence or the new one, never a partial state. Returns
    /// false if the id is unknown.
    pub fn replace_messages(&mut self, id: SessionId, messages: Vec<Message>) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.messages = messages;
                true
            }
            None => false,
        }
    }

    /// Set a session's title from `text`
    ///
    /// The title is the first [`TITLE_MAX_CHARS`] characters of `text`, with
    /// an ellipsis appended when truncation occurred. Returns false if the
    /// id is unknown.
    pub fn retitle(&mut self, id: SessionId, text: &str) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.title = truncate_title(text);
                true
            }
            None => false,
        }
    }

    /// Id of the active session, if any
    pub fn active_id(&self) -> Option<SessionId> {
        self.active
    }

    /// The active session, if any
    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|id| self.sessions.get(&id))
    }

    /// Look up a session by id
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// All sessions in display order (most recently created first)
    pub fn sessions_newest_first(&self) -> Vec<&Session> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.sessions.get(id))
            .collect()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if the store holds no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Truncate `text` to [`TITLE_MAX_CHARS`] characters, appending an ellipsis
/// when anything was cut off
fn truncate_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push('…');
    }
    title
}
