//! Gateway server command handler
//!
//! Resolves the upstream credential, builds the assistant service, and
//! serves the gateway router until the process is stopped.

use crate::assistant::AssistantService;
use crate::config::{self, Config};
use crate::error::Result;
use crate::gateway;
use std::sync::Arc;

/// Run the gateway HTTP server
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `host` - Optional override for the configured bind host
/// * `port` - Optional override for the configured bind port
///
/// # Errors
///
/// Returns error when the configuration is incomplete for serving, the
/// credential cannot be resolved, or the listener fails to bind.
pub async fn run_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    config.validate_for_serve()?;

    let api_key = config::resolve_api_key()?;

    #[cfg(feature = "prometheus")]
    install_metrics_exporter();

    let service = Arc::new(AssistantService::new(config.assistant.clone(), api_key)?);
    let app = gateway::router(service);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "prometheus")]
fn install_metrics_exporter() {
    use metrics_exporter_prometheus::PrometheusBuilder;

    if let Err(err) = PrometheusBuilder::new().install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", err);
    }
}
