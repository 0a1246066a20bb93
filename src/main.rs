//! Foliochat - folder-scoped document chat CLI
//!
//! Main entry point for the Foliochat application.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foliochat::cli::{Cli, Commands, IngestCommand};
use foliochat::commands;
use foliochat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // If the user supplied a history DB path on the CLI, mirror it into
    // FOLIOCHAT_HISTORY_DB so the storage initializer can pick it up.
    if let Some(db_path) = &cli.history_db {
        std::env::set_var("FOLIOCHAT_HISTORY_DB", db_path);
        tracing::info!("Using history DB override from CLI: {}", db_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { folder } => {
            tracing::info!("Starting interactive chat");
            commands::chat::run_chat(config, folder).await?;
            Ok(())
        }
        Commands::Ingest { command } => match command {
            IngestCommand::Text {
                file,
                folder,
                title,
                author,
            } => {
                tracing::info!("Ingesting text file: {}", file.display());
                commands::ingest::run_ingest_text(&config, &file, &folder, title, author).await?;
                Ok(())
            }
            IngestCommand::Pdf {
                file,
                folder,
                title,
                author,
            } => {
                tracing::info!("Ingesting PDF for OCR: {}", file.display());
                commands::ingest::run_ingest_pdf(&config, &file, &folder, title, author).await?;
                Ok(())
            }
        },
        Commands::Outline { folder, questions } => {
            tracing::info!("Generating outlines for {} questions", questions.len());
            commands::outline::run_outline(&config, &folder, questions).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            commands::sessions::handle_sessions(command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "foliochat=debug"
    } else {
        "foliochat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
