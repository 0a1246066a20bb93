use crate::cli::SessionCommand;
use crate::error::Result;
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle session management commands
pub fn handle_sessions(command: SessionCommand) -> Result<()> {
    let storage = SqliteStorage::new()?;

    match command {
        SessionCommand::List => {
            let sessions = storage.list_sessions()?;

            if sessions.is_empty() {
                println!("{}", "No saved sessions found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Folder".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for session in sessions {
                let id_short = &session.id[..8];
                let title = if session.title.chars().count() > 40 {
                    let prefix: String = session.title.chars().take(37).collect();
                    format!("{}...", prefix)
                } else {
                    session.title
                };
                let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    id_short.cyan(),
                    title,
                    session.folder_name,
                    session.message_count,
                    updated
                ]);
            }

            println!("\nSaved Sessions:");
            table.printstd();
            println!();
            println!(
                "Use {} inside a chat to continue one.",
                "/switch <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Delete { id } => {
            storage.delete_session(&id)?;
            println!("{}", format!("Deleted session {}", id).green());
        }
    }

    Ok(())
}
