//! Deskmind - session-aware assistant gateway
//!
#![doc = "Deskmind - session-aware assistant gateway"]
#![doc = "Main entry point for the Deskmind application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deskmind::cli::{Cli, Commands};
use deskmind::commands;
use deskmind::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path)?;
    config.validate()?;

    match cli.command {
        Commands::Serve { host, port } => {
            tracing::info!("Starting gateway server");
            commands::serve::run_serve(config, host, port).await
        }
        Commands::Chat { gateway_url, user } => {
            tracing::info!("Starting interactive chat mode");
            commands::chat::run_chat(config, gateway_url, user).await
        }
        Commands::Chats { command } => commands::chats::handle_chats(command),
        Commands::Secret { command } => commands::secret::handle_secret(command),
    }
}

/// Initialize the tracing subscriber
///
/// Respects `RUST_LOG`; defaults to info-level output for the crate and
/// warn for dependencies.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,deskmind=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
