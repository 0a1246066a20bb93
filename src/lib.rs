//! Foliochat - folder-scoped document chat client library
//!
//! This library provides the core functionality of Foliochat: the streaming
//! chat-response consumer, the session state machine, and the backend client
//! for a folder-scoped document-chat service.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `protocol`: newline-delimited stream decoding and response assembly
//! - `session`: message/chunk data model, session store, source resolution
//! - `controller`: the per-exchange state machine driving an exchange end to end
//! - `client`: the backend collaborator trait and its HTTP implementation
//! - `storage`: sqlite persistence of sessions
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use foliochat::client::HttpBackend;
//! use foliochat::controller::ChatController;
//! use foliochat::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!     let controller = ChatController::new(backend, config.settle_delay());
//!     let report = controller
//!         .send_message("What is X?", "docs", |partial| print!("\r{}", partial))
//!         .await?;
//!     println!("\n{} sources cited", report.message.sources.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, ResponseMode};
pub use controller::{ChatController, ExchangeReport};
pub use error::{FolioError, Result};
pub use session::{Message, Role, Session, SessionStore};
