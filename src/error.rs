//! Error types for Foliochat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Foliochat operations
///
/// This enum encompasses all possible errors that can occur while
/// validating input, talking to the backend, consuming a response
/// stream, and persisting sessions.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Input rejected before any network call (empty message, empty
    /// folder, exchange already in flight)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend transport errors (connection failure, non-success HTTP
    /// status, unreadable response body)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Fatal protocol errors (an explicit error record in the response
    /// stream, or an error field in a unary response)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session persistence errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Foliochat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
