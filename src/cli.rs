//! Command-line interface definition for Foliochat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chat, document ingestion, outline generation,
//! and session management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Foliochat - chat with your document folders
///
/// Converse with an AI assistant about documents ingested into named
/// backend folders, and inspect the source passages behind each answer.
#[derive(Parser, Debug, Clone)]
#[command(name = "foliochat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL from config
    #[arg(long, env = "FOLIOCHAT_BACKEND")]
    pub backend: Option<String>,

    /// Override the session history database path
    #[arg(long)]
    pub history_db: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Foliochat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Folder to bind the conversation to (overrides config default)
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Ingest a document into a backend folder
    Ingest {
        /// Ingestion subcommand
        #[command(subcommand)]
        command: IngestCommand,
    },

    /// Generate outlines for one or more questions from a folder
    Outline {
        /// Folder to draw evidence from
        #[arg(short, long)]
        folder: String,

        /// Questions to outline
        #[arg(required = true)]
        questions: Vec<String>,
    },

    /// Manage saved chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Document ingestion subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum IngestCommand {
    /// Upload a plain-text file
    Text {
        /// Path to the text file
        file: PathBuf,

        /// Folder to ingest into
        #[arg(short, long)]
        folder: String,

        /// Document title (extracted by the backend when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Document author (extracted by the backend when omitted)
        #[arg(long)]
        author: Option<String>,
    },

    /// Upload a scanned PDF for backend OCR
    Pdf {
        /// Path to the PDF file
        file: PathBuf,

        /// Folder to ingest into
        #[arg(short, long)]
        folder: String,

        /// Document title (extracted by the backend when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Document author (extracted by the backend when omitted)
        #[arg(long)]
        author: Option<String>,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List saved sessions
    List,

    /// Delete a saved session by id (full UUID or 8-char prefix)
    Delete {
        /// Session id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            backend: None,
            history_db: None,
            command: Commands::Chat { folder: None },
        }
    }
}
