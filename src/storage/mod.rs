use crate::error::{FolioError, Result};
use crate::session::{Session, SessionId};
use anyhow::Context;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection};
use std::path::PathBuf;

pub mod types;
pub use types::StoredSession;

/// Storage backend for chat sessions
///
/// Sessions are saved after each committed exchange and loaded at startup;
/// persistence is never consulted mid-exchange.
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory.
    pub fn new() -> Result<Self> {
        // Allow override of the history DB path via environment variable.
        // This makes it easy to point the binary at a test DB or alternate
        // file without changing the user's application data dir.
        if let Ok(override_path) = std::env::var("FOLIOCHAT_HISTORY_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "foliochat", "foliochat")
            .ok_or_else(|| FolioError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let db_path = data_dir.join("sessions.db");
        let storage = Self { db_path };

        storage.init()?;

        Ok(storage)
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists so opening the DB file succeeds.
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| FolioError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                folder_name TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                messages JSON NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| FolioError::Storage(e.to_string()))?;

        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| FolioError::Storage(e.to_string()).into())
    }

    /// Save or update a session
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let conn = self.open()?;

        let messages_json = serde_json::to_string(&session.messages)
            .context("Failed to serialize messages")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO sessions (id, folder_name, title, created_at, updated_at, messages)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                folder_name = excluded.folder_name,
                title = excluded.title,
                updated_at = excluded.updated_at,
                messages = excluded.messages",
            params![
                session.id.to_string(),
                session.folder_name,
                session.title,
                session.created_at.to_rfc3339(),
                now,
                messages_json
            ],
        )
        .context("Failed to save session")
        .map_err(|e| FolioError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load all sessions, oldest first
    ///
    /// Rows whose id, timestamps, or message payload fail to parse are
    /// skipped with a warning rather than failing the whole load.
    pub fn load_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, folder_name, title, created_at, messages
                FROM sessions
                ORDER BY created_at ASC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let folder_name: String = row.get(1)?;
                let title: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                let messages_json: String = row.get(4)?;
                Ok((id, folder_name, title, created_at, messages_json))
            })
            .context("Failed to query sessions")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let mut sessions = Vec::new();
        for row in rows.flatten() {
            let (id, folder_name, title, created_at, messages_json) = row;
            let parsed_id: SessionId = match id.parse() {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!("skipping stored session with invalid id: {}", id);
                    continue;
                }
            };
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            let messages = match serde_json::from_str(&messages_json) {
                Ok(messages) => messages,
                Err(e) => {
                    tracing::warn!("skipping stored session {} with bad messages: {}", id, e);
                    continue;
                }
            };

            sessions.push(Session {
                id: parsed_id,
                folder_name,
                title,
                created_at,
                messages,
            });
        }

        Ok(sessions)
    }

    /// List stored session metadata, most recently updated first
    pub fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, folder_name, title, created_at, updated_at, messages
                FROM sessions
                ORDER BY updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let folder_name: String = row.get(1)?;
                let title: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                let updated_at: String = row.get(4)?;
                let messages_json: String = row.get(5)?;

                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                let updated_at = DateTime::parse_from_rfc3339(&updated_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());

                let message_count =
                    if let Ok(val) = serde_json::from_str::<serde_json::Value>(&messages_json) {
                        val.as_array().map(|a| a.len()).unwrap_or(0)
                    } else {
                        0
                    };

                Ok(StoredSession {
                    id,
                    folder_name,
                    title,
                    created_at,
                    updated_at,
                    message_count,
                })
            })
            .context("Failed to query sessions")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        Ok(rows.flatten().collect())
    }

    /// Delete a stored session (supports full UUID or 8-char prefix)
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let conn = self.open()?;

        let (query, param) = if id.len() == 36 {
            ("DELETE FROM sessions WHERE id = ?", id.to_string())
        } else {
            ("DELETE FROM sessions WHERE id LIKE ?", format!("{}%", id))
        };

        conn.execute(query, params![param])
            .context("Failed to delete session")
            .map_err(|e| FolioError::Storage(e.to_string()))?;

        Ok(())
    }
}
