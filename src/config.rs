//! Configuration management for Foliochat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from a YAML file with CLI overrides.

use crate::cli::Cli;
use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Foliochat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat behavior settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Which response shape to consume from `/chat`
///
/// The backend can answer as a stream of newline-delimited records or as a
/// single JSON object; both are supported and the choice is configuration,
/// not guesswork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Newline-delimited JSON records, rendered incrementally
    #[default]
    Streaming,
    /// One JSON object per exchange
    Unary,
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => write!(f, "streaming"),
            Self::Unary => write!(f, "unary"),
        }
    }
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the document-chat backend
    #[serde(default = "default_host")]
    pub host: String,

    /// Response shape to consume from `/chat`
    #[serde(default)]
    pub response_mode: ResponseMode,

    /// Overall request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_host() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            response_mode: ResponseMode::default(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Chat behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Delay in milliseconds after creating a session before its first use.
    /// A scheduling nicety only; nothing may rely on it for ordering.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Folder to bind new chats to when none is given on the command line
    #[serde(default)]
    pub default_folder: Option<String>,
}

fn default_settle_delay_ms() -> u64 {
    250
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            default_folder: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, falling back to defaults when
    /// the file does not exist, then apply CLI overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&contents).map_err(FolioError::Yaml)?
        } else {
            tracing::debug!("config file {} not found, using defaults", path);
            Self::default()
        };

        if let Some(backend) = &cli.backend {
            config.backend.host = backend.clone();
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the backend host is not a valid URL or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.host).map_err(|e| {
            FolioError::Config(format!(
                "invalid backend host '{}': {}",
                self.backend.host, e
            ))
        })?;

        if self.backend.timeout_seconds == 0 {
            return Err(
                FolioError::Config("timeout_seconds must be greater than zero".to_string()).into(),
            );
        }

        Ok(())
    }

    /// The configured settle delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.chat.settle_delay_ms)
    }
}
