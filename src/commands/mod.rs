/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`     — Interactive chat session
- `ingest`   — Document upload (text and scanned PDF)
- `outline`  — Outline generation for a set of questions
- `sessions` — Saved-session listing and deletion

These handlers are intentionally small and use the library components:
the backend client, the controller, and the session store.
*/

pub mod chat;
pub mod ingest;
pub mod outline;
pub mod sessions;
