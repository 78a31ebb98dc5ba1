//! Saved-chat management command handler

use crate::cli::ChatsCommand;
use crate::error::Result;
use crate::storage::{ChatStorage, MessageRole};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle saved-chat commands
pub fn handle_chats(command: ChatsCommand) -> Result<()> {
    let storage = ChatStorage::new()?;

    match command {
        ChatsCommand::List { user } => {
            let chats = storage.user_chats(&user)?;

            if chats.is_empty() {
                println!("{}", "No saved chats found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Created".bold(),
                "Last Updated".bold()
            ]);

            for chat in chats {
                let id_short = &chat.id[..8];
                let title = if chat.title.len() > 40 {
                    format!("{}...", &chat.title[..37])
                } else {
                    chat.title
                };
                table.add_row(prettytable::row![
                    id_short.cyan(),
                    title,
                    chat.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    chat.updated_at.format("%Y-%m-%d %H:%M").to_string()
                ]);
            }

            println!("\nSaved chats:");
            table.printstd();
            println!();
            println!(
                "Use {} to inspect a chat.",
                "deskmind chats show <ID>".cyan()
            );
            println!();
        }
        ChatsCommand::Show { id } => {
            let chat = match storage.get_chat(&id)? {
                Some(chat) => chat,
                None => {
                    println!("{}", format!("No chat with id {}", id).yellow());
                    return Ok(());
                }
            };

            println!("\n{}\n", chat.title.bold());
            for message in storage.chat_messages(&id)? {
                let label = match message.role {
                    MessageRole::User => "user".green(),
                    MessageRole::Assistant => "assistant".cyan(),
                };
                println!(
                    "[{}] {}: {}",
                    message.timestamp.format("%Y-%m-%d %H:%M"),
                    label,
                    message.content
                );
            }
            println!();
        }
        ChatsCommand::Rename { id, title } => {
            storage.update_chat_title(&id, &title)?;
            println!("{}", format!("Renamed chat {}", id).green());
        }
        ChatsCommand::Delete { id } => {
            storage.delete_chat(&id)?;
            println!("{}", format!("Deleted chat {}", id).green());
        }
    }

    Ok(())
}
