use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a stored chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// Unique identifier for the session
    pub id: String,
    /// Folder the session is bound to
    pub folder_name: String,
    /// Display title
    pub title: String,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last updated
    pub updated_at: DateTime<Utc>,
    /// Number of messages in the session
    pub message_count: usize,
}
