//! Assistant API key management
//!
//! Stores the upstream credential in the platform keyring so the serve
//! command can run without the key in the environment.

use crate::cli::SecretCommand;
use crate::config::{KEYRING_API_KEY_ENTRY, KEYRING_SERVICE};
use crate::error::{DeskmindError, Result};
use colored::Colorize;
use std::io::{BufRead, Write};

/// Handle credential commands
pub fn handle_secret(command: SecretCommand) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY_ENTRY)?;

    match command {
        SecretCommand::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => prompt_for_key()?,
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(DeskmindError::Config("API key cannot be empty".to_string()).into());
            }
            entry.set_password(key)?;
            println!("{}", "Assistant API key stored.".green());
        }
        SecretCommand::Show => match entry.get_password() {
            Ok(_) => println!("{}", "Assistant API key is configured.".green()),
            Err(keyring::Error::NoEntry) => {
                println!("{}", "No assistant API key stored.".yellow())
            }
            Err(err) => return Err(DeskmindError::Keyring(err).into()),
        },
        SecretCommand::Clear => match entry.delete_password() {
            Ok(()) => println!("{}", "Assistant API key removed.".green()),
            Err(keyring::Error::NoEntry) => {
                println!("{}", "Nothing to clear.".yellow())
            }
            Err(err) => return Err(DeskmindError::Keyring(err).into()),
        },
    }

    Ok(())
}

fn prompt_for_key() -> Result<String> {
    print!("Assistant API key: ");
    std::io::stdout().flush()?;
    let mut key = String::new();
    std::io::stdin().lock().read_line(&mut key)?;
    Ok(key)
}
