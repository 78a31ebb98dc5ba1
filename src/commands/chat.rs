//! Interactive chat mode handler
//!
//! Runs a readline-based loop that submits user input to the
//! orchestrator and prints assistant replies. Special commands manage
//! the conversation: `/new`, `/retry`, `/history`, `/sessions`,
//! `/load <id>`, and `/help`.

use crate::chat::orchestrator::ANONYMOUS_USER;
use crate::chat::{HttpGateway, Orchestrator, Sender, TranscriptMessage};
use crate::config::Config;
use crate::error::Result;
use crate::session::{spawn_cleanup_task, SessionStore};
use crate::storage::ChatStorage;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `gateway_url` - Optional override for the configured gateway endpoint
/// * `user` - User identifier; `None` chats as a guest
pub async fn run_chat(
    config: Config,
    gateway_url: Option<String>,
    user: Option<String>,
) -> Result<()> {
    let endpoint = gateway_url.unwrap_or_else(|| config.client.gateway_url.clone());
    let gateway = Arc::new(HttpGateway::new(
        &endpoint,
        config.client.request_timeout_secs,
    )?);

    let store = Arc::new(Mutex::new(SessionStore::new(config.session.clone())));
    let sweep = spawn_cleanup_task(
        Arc::clone(&store),
        Duration::from_secs(config.session.cleanup_interval_secs),
    );

    let user_id = user.unwrap_or_else(|| ANONYMOUS_USER.to_string());

    // Durable mirroring is best-effort: a broken local database
    // degrades to guest-style in-memory chat instead of failing.
    let storage = if user_id != ANONYMOUS_USER {
        match ChatStorage::new() {
            Ok(storage) => Some(Arc::new(storage)),
            Err(err) => {
                tracing::warn!("Chat storage unavailable, not mirroring: {}", err);
                None
            }
        }
    } else {
        None
    };

    let mut orchestrator = Orchestrator::new(gateway, Arc::clone(&store), storage, &user_id);

    let mut rl = DefaultEditor::new()?;
    print_banner(&endpoint, &user_id);

    loop {
        match rl.readline(&format!("{} ", "deskmind>".cyan())) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    "exit" | "quit" => break,
                    "/help" => print_help(),
                    "/new" => {
                        orchestrator.start_new_conversation();
                        println!("{}\n", "Started a new conversation.".green());
                    }
                    "/retry" => match orchestrator.retry_last_message().await {
                        Ok(Some(message)) => print_reply(&message),
                        Ok(None) => println!("{}\n", "Nothing to retry yet.".yellow()),
                        Err(err) => println!("{}\n", format!("Retry failed: {}", err).red()),
                    },
                    "/history" => print_history(orchestrator.transcript()),
                    "/sessions" => print_sessions(&store),
                    command if command.starts_with("/delete ") => {
                        let id = command.trim_start_matches("/delete ").trim();
                        let removed = store
                            .lock()
                            .map(|mut store| store.delete_session(id))
                            .unwrap_or(false);
                        if removed {
                            println!("{}\n", format!("Deleted session {}", id).green());
                        } else {
                            println!("{}\n", format!("No session {}", id).yellow());
                        }
                    }
                    command if command.starts_with("/load ") => {
                        let id = command.trim_start_matches("/load ").trim();
                        match orchestrator.load_conversation(id) {
                            Ok(()) => {
                                println!("{}\n", format!("Loaded conversation {}", id).green());
                                print_history(orchestrator.transcript());
                            }
                            Err(err) => {
                                println!("{}\n", format!("Failed to load: {}", err).red())
                            }
                        }
                    }
                    command if command.starts_with('/') => {
                        println!(
                            "{}\n",
                            format!("Unknown command: {} (try /help)", command).yellow()
                        );
                    }
                    message => match orchestrator.send_message(message).await {
                        Ok(reply) => print_reply(&reply),
                        Err(err) => println!("{}\n", format!("{}", err).red()),
                    },
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    sweep.abort();
    println!("{}", "Goodbye!".cyan());
    Ok(())
}

fn print_banner(endpoint: &str, user_id: &str) {
    println!();
    println!("{}", "Deskmind chat".bold());
    println!("Gateway: {}", endpoint.cyan());
    if user_id == ANONYMOUS_USER {
        println!("User: {} (conversations are not saved)", "guest".yellow());
    } else {
        println!("User: {}", user_id.green());
    }
    println!("Type {} for commands, {} to leave.", "/help".cyan(), "exit".cyan());
    println!();
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  {}        Start a new conversation", "/new".cyan());
    println!("  {}      Resubmit the last message", "/retry".cyan());
    println!("  {}    Show the current transcript", "/history".cyan());
    println!("  {}   List in-memory sessions", "/sessions".cyan());
    println!("  {}  Switch to another session", "/load <id>".cyan());
    println!("  {} Delete a session", "/delete <id>".cyan());
    println!("  {}        Leave the chat", "exit".cyan());
    println!();
}

fn print_reply(message: &TranscriptMessage) {
    println!("\n{}\n", message.content);
}

fn print_history(transcript: &[TranscriptMessage]) {
    if transcript.is_empty() {
        println!("{}\n", "No messages yet.".yellow());
        return;
    }
    println!();
    for message in transcript {
        let label = match message.sender {
            Sender::User => "you".green(),
            Sender::Assistant => "assistant".cyan(),
        };
        println!("{}: {}", label, message.content);
    }
    println!();
}

fn print_sessions(store: &Arc<Mutex<SessionStore>>) {
    let store = match store.lock() {
        Ok(store) => store,
        Err(_) => {
            println!("{}\n", "Session store unavailable.".red());
            return;
        }
    };

    let sessions = store.sessions();
    if sessions.is_empty() {
        println!("{}\n", "No sessions.".yellow());
        return;
    }

    println!();
    for session in sessions {
        let bound = if session.is_bound() { "bound" } else { "new" };
        println!(
            "{}  {} exchange(s), {}, last active {}",
            session.id.cyan(),
            session.history.len(),
            bound,
            session.last_activity.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
}
