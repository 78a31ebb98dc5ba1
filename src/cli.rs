//! Command-line interface definition for Deskmind
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for serving the gateway, interactive chat,
//! saved-chat management, and credential storage.

use clap::{Parser, Subcommand};

/// Deskmind - session-aware assistant gateway
///
/// Serve the gateway endpoint bridging chat clients to the hosted
/// assistants API, or chat against a running gateway interactively.
#[derive(Parser, Debug, Clone)]
#[command(name = "deskmind")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Deskmind
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the gateway HTTP server
    Serve {
        /// Override the bind host from config
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port from config
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat session against a gateway
    Chat {
        /// Override the gateway endpoint URL from config
        #[arg(short, long)]
        gateway_url: Option<String>,

        /// User identifier; omit to chat as a guest
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Manage saved chats of authenticated users
    Chats {
        /// Saved-chat subcommand
        #[command(subcommand)]
        command: ChatsCommand,
    },

    /// Manage the assistant API key in the platform keyring
    Secret {
        /// Credential subcommand
        #[command(subcommand)]
        command: SecretCommand,
    },
}

/// Saved-chat management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatsCommand {
    /// List a user's saved chats
    List {
        /// Owning user identifier
        #[arg(short, long)]
        user: String,
    },

    /// Show a saved chat's messages
    Show {
        /// Chat identifier
        id: String,
    },

    /// Rename a saved chat
    Rename {
        /// Chat identifier
        id: String,

        /// New title
        title: String,
    },

    /// Delete a saved chat and its messages
    Delete {
        /// Chat identifier
        id: String,
    },
}

/// Credential management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SecretCommand {
    /// Store the assistant API key (prompts on stdin when not given)
    Set {
        /// API key value; omit to read from stdin
        #[arg(long)]
        key: Option<String>,
    },

    /// Report whether an API key is stored
    Show,

    /// Remove the stored API key
    Clear,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
