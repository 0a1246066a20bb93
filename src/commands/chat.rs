//! Interactive chat session handler
//!
//! Runs a readline loop that submits user input to the conversation
//! controller and renders the assistant answer incrementally as deltas
//! arrive. Slash commands manage sessions, the folder binding, and source
//! inspection; sessions are persisted after each committed exchange.

use crate::client::HttpBackend;
use crate::config::Config;
use crate::controller::ChatController;
use crate::error::{FolioError, Result};
use crate::session::{resolve_source, SessionId, SessionStore};
use crate::storage::SqliteStorage;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Parsed chat-loop input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Plain text to send to the assistant
    Message,
    /// Leave the chat loop
    Exit,
    /// Show available commands
    Help,
    /// List sessions
    Sessions,
    /// Switch the active session (by list index or id prefix)
    Switch(String),
    /// Delete a session (by list index or id prefix)
    Delete(String),
    /// Rebind the folder for subsequent messages
    Folder(String),
    /// Show the sources cited by the last answer
    Sources,
    /// Show the chunks behind one source label
    Inspect(String),
    /// Unrecognized slash command
    Unknown(String),
}

/// Parse one line of chat input
pub fn parse_chat_command(input: &str) -> ChatCommand {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return ChatCommand::Exit;
    }
    if !trimmed.starts_with('/') {
        return ChatCommand::Message;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/exit" | "/quit" => ChatCommand::Exit,
        "/help" => ChatCommand::Help,
        "/sessions" => ChatCommand::Sessions,
        "/sources" => ChatCommand::Sources,
        "/switch" if !rest.is_empty() => ChatCommand::Switch(rest.to_string()),
        "/delete" if !rest.is_empty() => ChatCommand::Delete(rest.to_string()),
        "/folder" if !rest.is_empty() => ChatCommand::Folder(rest.to_string()),
        "/inspect" if !rest.is_empty() => ChatCommand::Inspect(rest.to_string()),
        other => ChatCommand::Unknown(other.to_string()),
    }
}

fn read_store(store: &Arc<RwLock<SessionStore>>) -> Result<RwLockReadGuard<'_, SessionStore>> {
    store
        .read()
        .map_err(|_| anyhow::anyhow!("session store lock poisoned"))
}

fn write_store(store: &Arc<RwLock<SessionStore>>) -> Result<RwLockWriteGuard<'_, SessionStore>> {
    store
        .write()
        .map_err(|_| anyhow::anyhow!("session store lock poisoned"))
}

/// Start an interactive chat session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `folder` - Optional folder override; falls back to `chat.default_folder`
pub async fn run_chat(config: Config, folder: Option<String>) -> Result<()> {
    let mut folder = folder
        .or_else(|| config.chat.default_folder.clone())
        .ok_or_else(|| {
            FolioError::Config(
                "no folder given; pass --folder or set chat.default_folder".to_string(),
            )
        })?;

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let storage = SqliteStorage::new()?;

    let store = Arc::new(RwLock::new(SessionStore::new()));
    {
        let sessions = storage.load_sessions()?;
        if !sessions.is_empty() {
            tracing::info!("restored {} saved sessions", sessions.len());
        }
        let mut store = write_store(&store)?;
        for session in sessions {
            store.restore(session);
        }
    }

    let controller = ChatController::with_store(backend, Arc::clone(&store), config.settle_delay());

    print_welcome_banner(&folder);
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(&format!("[{}] >> ", folder)) {
            Ok(line) => {
                let trimmed = line.trim().to_string();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&trimmed)?;

                match parse_chat_command(&trimmed) {
                    ChatCommand::Exit => break,
                    ChatCommand::Help => {
                        print_help();
                        continue;
                    }
                    ChatCommand::Sessions => {
                        let guard = read_store(&store)?;
                        print_sessions(&guard);
                        continue;
                    }
                    ChatCommand::Switch(selector) => {
                        let mut guard = write_store(&store)?;
                        let selected =
                            select_session(&guard, &selector).filter(|id| guard.switch_active(*id));
                        match selected.and_then(|id| guard.get(id)) {
                            Some(session) => {
                                folder = session.folder_name.clone();
                                println!("Switched to \"{}\"\n", session.title);
                            }
                            None => println!("{}", "No session matches that selector.".yellow()),
                        }
                        continue;
                    }
                    ChatCommand::Delete(selector) => {
                        let deleted = {
                            let mut guard = write_store(&store)?;
                            let selected = select_session(&guard, &selector);
                            if let Some(id) = selected {
                                guard.delete_session(id);
                            }
                            selected
                        };
                        match deleted {
                            Some(id) => {
                                storage.delete_session(&id.to_string())?;
                                println!("{}", format!("Deleted session {}", id).green());
                            }
                            None => println!("{}", "No session matches that selector.".yellow()),
                        }
                        continue;
                    }
                    ChatCommand::Folder(name) => {
                        folder = name;
                        println!(
                            "Folder set to \"{}\"; the next message starts there.\n",
                            folder
                        );
                        continue;
                    }
                    ChatCommand::Sources => {
                        let guard = read_store(&store)?;
                        print_last_sources(&guard);
                        continue;
                    }
                    ChatCommand::Inspect(label) => {
                        let guard = read_store(&store)?;
                        print_inspection(&guard, &label);
                        continue;
                    }
                    ChatCommand::Unknown(command) => {
                        println!(
                            "{}",
                            format!("Unknown command {}; type /help for a list.", command).yellow()
                        );
                        continue;
                    }
                    ChatCommand::Message => {}
                }

                print!("{}", "assistant> ".bold());
                std::io::stdout().flush().ok();

                let mut printed = 0usize;
                let result = controller
                    .send_message(&trimmed, &folder, |content| {
                        // Content is append-only, so the unseen suffix is the delta.
                        print!("{}", &content[printed..]);
                        std::io::stdout().flush().ok();
                        printed = content.len();
                    })
                    .await;
                println!();

                match result {
                    Ok(report) => {
                        if report.message.has_sources() {
                            println!(
                                "{}",
                                format!("Sources: {}", report.message.sources.join("; ")).cyan()
                            );
                            println!("{}", "Use /inspect <source> to see the passages.".dimmed());
                        }
                        println!();

                        let session = read_store(&store)?.get(report.session_id).cloned();
                        if let Some(session) = session {
                            if let Err(e) = storage.save_session(&session) {
                                tracing::warn!("failed to persist session: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        eprintln!("{}\n", format!("Error: {}", e).red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Find a session by 1-based display index or id prefix
fn select_session(store: &SessionStore, selector: &str) -> Option<SessionId> {
    let sessions = store.sessions_newest_first();
    if let Ok(index) = selector.parse::<usize>() {
        if index >= 1 {
            return sessions.get(index - 1).map(|s| s.id);
        }
    }
    sessions
        .iter()
        .find(|s| s.id.to_string().starts_with(selector))
        .map(|s| s.id)
}

fn print_welcome_banner(folder: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              Foliochat - chat with your folders              ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Folder: {}", folder.cyan());
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

fn print_help() {
    println!("\nAvailable commands:");
    println!("  /sessions          List conversations (newest first)");
    println!("  /switch <n|id>     Switch to a conversation by index or id prefix");
    println!("  /delete <n|id>     Delete a conversation by index or id prefix");
    println!("  /folder <name>     Bind subsequent messages to another folder");
    println!("  /sources           Show sources cited by the last answer");
    println!("  /inspect <source>  Show the passages behind one source");
    println!("  /help              Show this help");
    println!("  exit               Leave the chat\n");
}

fn print_sessions(store: &SessionStore) {
    let sessions = store.sessions_newest_first();
    if sessions.is_empty() {
        println!("{}", "No sessions yet.".yellow());
        return;
    }

    println!();
    for (index, session) in sessions.iter().enumerate() {
        let marker = if store.active_id() == Some(session.id) {
            "*"
        } else {
            " "
        };
        let id_short = session.id.to_string()[..8].to_string();
        println!(
            "{} {:>2}. {}  {} [{}] ({} messages)",
            marker,
            index + 1,
            id_short.cyan(),
            session.title,
            session.folder_name,
            session.messages.len()
        );
    }
    println!();
}

fn print_last_sources(store: &SessionStore) {
    let last = store
        .active()
        .and_then(|s| s.messages.iter().rev().find(|m| m.is_assistant()));

    match last {
        Some(message) if message.has_sources() => {
            println!("\nSources cited by the last answer:");
            for label in &message.sources {
                let inspection = resolve_source(message, label);
                match inspection.author {
                    Some(author) => println!("  - {} ({})", label, author),
                    None => println!("  - {}", label),
                }
            }
            println!();
        }
        Some(_) => println!("{}", "The last answer cited no sources.".yellow()),
        None => println!("{}", "No answer yet in this session.".yellow()),
    }
}

fn print_inspection(store: &SessionStore, label: &str) {
    let last = store
        .active()
        .and_then(|s| s.messages.iter().rev().find(|m| m.is_assistant()));

    let Some(message) = last else {
        println!("{}", "No answer yet in this session.".yellow());
        return;
    };

    let inspection = resolve_source(message, label);
    let Some(chunks) = inspection.chunks else {
        println!(
            "{}",
            format!("No passage data available for \"{}\".", label).yellow()
        );
        return;
    };

    println!("\n{}", label.bold());
    match inspection.author {
        Some(author) => println!("Author: {}", author),
        None => println!("Author: {}", "unknown".dimmed()),
    }
    for (index, chunk) in chunks.iter().enumerate() {
        match chunk.distance {
            Some(distance) => {
                println!("\n--- passage {} (distance {:.3}) ---", index + 1, distance)
            }
            None => println!("\n--- passage {} ---", index + 1),
        }
        println!("{}", chunk.text);
    }
    println!();
}
