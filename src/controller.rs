//! Conversation controller
//!
//! Orchestrates one exchange end to end: validates the input, makes sure a
//! session bound to the right folder is active, appends the user message,
//! drives the stream decoder and response assembler over the backend reply,
//! and commits the finalized assistant message. Every failure after the
//! user message was appended rolls the session back to its exact
//! pre-exchange message sequence; a drop guard makes cancellation mid-stream
//! roll back the same way.

use crate::client::{ChatBackend, ChatBody, ChatRequest, HistoryEntry};
use crate::error::{FolioError, Result};
use crate::protocol::{assemble_unary, Applied, LineDecoder, ResponseAssembler};
use crate::session::{Message, SessionId, SessionStore};
use futures::StreamExt;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

/// Phase of an exchange, used for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    Validating,
    SessionReady,
    Sending,
    Streaming,
    Finalizing,
    Committed,
    RolledBack,
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::SessionReady => "session-ready",
            Self::Sending => "sending",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        };
        write!(f, "{}", phase)
    }
}

/// Result of a committed exchange
#[derive(Debug, Clone)]
pub struct ExchangeReport {
    /// Session the exchange ran in
    pub session_id: SessionId,
    /// The finalized assistant message
    pub message: Message,
}

/// Restores the pre-exchange message sequence unless the exchange committed
///
/// Dropping the guard (through an error return, a panic, or cancellation of
/// the exchange future) removes the in-flight mark and, when the exchange
/// has not committed, swaps the snapshot back in.
struct RollbackGuard {
    store: Arc<RwLock<SessionStore>>,
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
    session_id: SessionId,
    snapshot: Vec<Message>,
    committed: bool,
}

impl RollbackGuard {
    fn new(
        store: Arc<RwLock<SessionStore>>,
        in_flight: Arc<Mutex<HashSet<SessionId>>>,
        session_id: SessionId,
        snapshot: Vec<Message>,
    ) -> Self {
        Self {
            store,
            in_flight,
            session_id,
            snapshot,
            committed: false,
        }
    }

    fn snapshot(&self) -> &[Message] {
        &self.snapshot
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for RollbackGuard {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.session_id);
        }
        if self.committed {
            return;
        }
        if let Ok(mut store) = self.store.write() {
            if store.get(self.session_id).is_some() {
                store.replace_messages(self.session_id, std::mem::take(&mut self.snapshot));
                tracing::warn!(
                    phase = %ExchangePhase::RolledBack,
                    session_id = %self.session_id,
                    "exchange rolled back"
                );
            }
        }
    }
}

/// Drives chat exchanges against a backend and a session store
///
/// The controller is the only component that requests session mutations
/// during an exchange; the store itself remains the single writer. At most
/// one exchange per session may be in flight; exchanges on different
/// sessions interleave freely.
pub struct ChatController {
    store: Arc<RwLock<SessionStore>>,
    backend: Arc<dyn ChatBackend>,
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
    settle_delay: Duration,
}

impl ChatController {
    /// Create a controller with a fresh, empty session store
    pub fn new(backend: Arc<dyn ChatBackend>, settle_delay: Duration) -> Self {
        Self::with_store(backend, Arc::new(RwLock::new(SessionStore::new())), settle_delay)
    }

    /// Create a controller over an existing session store
    pub fn with_store(
        backend: Arc<dyn ChatBackend>,
        store: Arc<RwLock<SessionStore>>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store,
            backend,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            settle_delay,
        }
    }

    /// Shared handle to the session store
    pub fn store(&self) -> Arc<RwLock<SessionStore>> {
        Arc::clone(&self.store)
    }

    /// Run one exchange: send `text` on `folder_name` and stream the answer
    ///
    /// `on_update` is invoked with the full accumulated answer text after
    /// every content delta so the caller can re-render the in-progress
    /// message without waiting for completion.
    ///
    /// # Errors
    ///
    /// Validation failures (empty message or folder, exchange already in
    /// flight) return before any state change or network call. Transport and
    /// protocol failures roll the session back to its pre-exchange message
    /// sequence before being surfaced.
    pub async fn send_message(
        &self,
        text: &str,
        folder_name: &str,
        mut on_update: impl FnMut(&str),
    ) -> Result<ExchangeReport> {
        tracing::debug!(phase = %ExchangePhase::Validating, "starting exchange");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FolioError::Validation("message is required".to_string()).into());
        }
        let folder = folder_name.trim();
        if folder.is_empty() {
            return Err(FolioError::Validation("folder name is required".to_string()).into());
        }

        // A session bound to a different folder is never mutated; the
        // exchange gets a fresh session instead.
        let (session_id, created) = {
            let mut store = self.write_store()?;
            match store.active() {
                Some(active) if active.folder_name == folder => (active.id, false),
                _ => (store.create_session(folder), true),
            }
        };
        tracing::debug!(phase = %ExchangePhase::SessionReady, %session_id, "session ready");
        if created {
            // Let the just-created session settle before first use. Purely a
            // scheduling nicety; nothing depends on it for ordering.
            tokio::time::sleep(self.settle_delay).await;
        }

        let user_message = Message::user(trimmed);
        let (snapshot, history, first_exchange);
        {
            let mut store = self.write_store()?;
            let session = store.get(session_id).ok_or_else(|| {
                FolioError::Validation("session no longer exists".to_string())
            })?;
            snapshot = session.messages.clone();

            {
                let mut in_flight = self.lock_in_flight()?;
                if !in_flight.insert(session_id) {
                    return Err(FolioError::Validation(
                        "an exchange is already in flight for this session".to_string(),
                    )
                    .into());
                }
            }

            history = snapshot
                .iter()
                .map(|m| HistoryEntry {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect::<Vec<_>>();
            first_exchange = snapshot.is_empty();

            // The user message becomes visible before any response arrives.
            let mut with_user = snapshot.clone();
            with_user.push(user_message.clone());
            store.replace_messages(session_id, with_user);
        }
        let mut guard = RollbackGuard::new(
            Arc::clone(&self.store),
            Arc::clone(&self.in_flight),
            session_id,
            snapshot,
        );

        tracing::debug!(phase = %ExchangePhase::Sending, %session_id, "dispatching chat request");
        let request = ChatRequest {
            message: trimmed.to_string(),
            folder_name: folder.to_string(),
            conversation_history: history,
        };
        let body = self.backend.send_chat(&request).await?;

        let message = match body {
            ChatBody::Streamed(stream) => {
                self.consume_stream(stream, session_id, guard.snapshot(), &user_message, &mut on_update)
                    .await?
            }
            ChatBody::Unary(completion) => {
                let message = assemble_unary(completion)?;
                on_update(&message.content);
                message
            }
        };

        tracing::debug!(phase = %ExchangePhase::Finalizing, %session_id, "committing exchange");
        {
            let mut store = self.write_store()?;
            let mut committed = guard.snapshot().to_vec();
            committed.push(user_message);
            committed.push(message.clone());
            store.replace_messages(session_id, committed);
            if first_exchange {
                store.retitle(session_id, trimmed);
            }
        }
        guard.commit();

        tracing::info!(
            phase = %ExchangePhase::Committed,
            %session_id,
            sources = message.sources.len(),
            "exchange committed"
        );
        Ok(ExchangeReport {
            session_id,
            message,
        })
    }

    /// Decode and interpret a streamed response body
    ///
    /// After each content delta the trailing in-progress assistant message
    /// in the store is replaced and `on_update` fires. A transport error
    /// mid-stream or an error record aborts; an end of stream without a
    /// `complete` record finalizes whatever was accumulated.
    async fn consume_stream(
        &self,
        mut stream: crate::client::ByteStream,
        session_id: SessionId,
        snapshot: &[Message],
        user_message: &Message,
        on_update: &mut impl FnMut(&str),
    ) -> Result<Message> {
        tracing::debug!(phase = %ExchangePhase::Streaming, %session_id, "consuming response stream");
        let mut decoder = LineDecoder::new();
        let mut assembler = ResponseAssembler::new();

        // Empty placeholder so the pending answer is visible immediately.
        let mut pending = Message::assistant("");
        self.render_pending(session_id, snapshot, user_message, &pending)?;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            for line in decoder.push(&fragment) {
                if assembler.apply_line(&line)? == Applied::Content {
                    pending.content = assembler.content().to_string();
                    self.render_pending(session_id, snapshot, user_message, &pending)?;
                    on_update(assembler.content());
                }
            }
        }

        if !decoder.pending().is_empty() {
            tracing::debug!(
                "discarding incomplete trailing record ({} bytes)",
                decoder.pending().len()
            );
        }
        if !assembler.is_complete() {
            tracing::debug!(%session_id, "stream ended without completion record");
        }

        Ok(assembler.finalize())
    }

    /// Swap the in-progress assistant message into the store
    fn render_pending(
        &self,
        session_id: SessionId,
        snapshot: &[Message],
        user_message: &Message,
        pending: &Message,
    ) -> Result<()> {
        let mut store = self.write_store()?;
        let mut messages = snapshot.to_vec();
        messages.push(user_message.clone());
        messages.push(pending.clone());
        store.replace_messages(session_id, messages);
        Ok(())
    }

    fn write_store(&self) -> Result<std::sync::RwLockWriteGuard<'_, SessionStore>> {
        self.store
            .write()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))
    }

    fn lock_in_flight(&self) -> Result<std::sync::MutexGuard<'_, HashSet<SessionId>>> {
        self.in_flight
            .lock()
            .map_err(|_| anyhow::anyhow!("in-flight set lock poisoned"))
    }
}
