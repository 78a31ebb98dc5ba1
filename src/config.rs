//! Configuration management for Deskmind
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! It also resolves the upstream assistant API credential from the
//! environment or the platform keyring.

use crate::error::{DeskmindError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the assistant API key
pub const API_KEY_ENV: &str = "DESKMIND_API_KEY";

/// Keyring service name used for credential storage
pub const KEYRING_SERVICE: &str = "deskmind";

/// Keyring entry name for the assistant API key
pub const KEYRING_API_KEY_ENTRY: &str = "assistant_api_key";

/// Main configuration structure for Deskmind
///
/// Holds everything needed to run the gateway server, the interactive
/// chat client, and the session/storage layers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Upstream assistants API settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Gateway HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Session store behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Client-side settings for the chat command
    #[serde(default)]
    pub client: ClientConfig,
}

/// Upstream assistants API configuration
///
/// The upstream exposes Azure-style OpenAI Assistants resources:
/// assistants, threads, thread messages, and runs, addressed with an
/// `api-key` header and an `api-version` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Base URL of the assistants API (e.g. "https://myaccount.openai.azure.com/openai")
    #[serde(default)]
    pub base_url: String,

    /// API version query parameter sent with every request
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model bound to newly created assistants
    #[serde(default = "default_model")]
    pub model: String,

    /// Vector store identifier backing the assistant's file search tool
    #[serde(default)]
    pub vector_store_id: String,

    /// Display name given to newly created assistants
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Delay between run status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of run status polls before timing out
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Timeout for individual HTTP requests to the upstream API, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_version() -> String {
    "2024-05-01-preview".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_assistant_name() -> String {
    "Deskmind".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_request_timeout() -> u64 {
    120
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: default_api_version(),
            model: default_model(),
            vector_store_id: String::new(),
            assistant_name: default_assistant_name(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Gateway HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host for the gateway server
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the gateway server
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum number of exchanges retained per session
    #[serde(default = "default_max_history")]
    pub max_history_entries: usize,

    /// Number of recent exchanges rendered into the context window
    #[serde(default = "default_context_exchanges")]
    pub context_window_exchanges: usize,

    /// Character budget applied to each response in the context window
    #[serde(default = "default_context_budget")]
    pub context_response_budget: usize,

    /// Sessions idle longer than this many days are removed by the sweep
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,

    /// Interval between expiry sweeps, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_max_history() -> usize {
    100
}

fn default_context_exchanges() -> usize {
    3
}

fn default_context_budget() -> usize {
    500
}

fn default_expiry_days() -> i64 {
    7
}

fn default_cleanup_interval() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_entries: default_max_history(),
            context_window_exchanges: default_context_exchanges(),
            context_response_budget: default_context_budget(),
            expiry_days: default_expiry_days(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Client-side configuration for the chat command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// URL of the gateway's assistant endpoint
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Request timeout for gateway calls, in seconds
    ///
    /// Must comfortably exceed the server-side polling ceiling
    /// (poll_interval_ms * poll_max_attempts) or long runs will be cut
    /// off client-side first.
    #[serde(default = "default_client_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8787/v1/assistant".to_string()
}

fn default_client_timeout() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            request_timeout_secs: default_client_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DeskmindError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| DeskmindError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("DESKMIND_ASSISTANT_BASE_URL") {
            self.assistant.base_url = base_url;
        }

        if let Ok(model) = std::env::var("DESKMIND_ASSISTANT_MODEL") {
            self.assistant.model = model;
        }

        if let Ok(vector_store_id) = std::env::var("DESKMIND_VECTOR_STORE_ID") {
            self.assistant.vector_store_id = vector_store_id;
        }

        if let Ok(gateway_url) = std::env::var("DESKMIND_GATEWAY_URL") {
            self.client.gateway_url = gateway_url;
        }

        if let Ok(port) = std::env::var("DESKMIND_SERVER_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid DESKMIND_SERVER_PORT: {}", port);
            }
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.assistant.api_version.is_empty() {
            return Err(
                DeskmindError::Config("assistant.api_version cannot be empty".to_string()).into(),
            );
        }

        if self.assistant.model.is_empty() {
            return Err(
                DeskmindError::Config("assistant.model cannot be empty".to_string()).into(),
            );
        }

        if self.assistant.poll_max_attempts == 0 {
            return Err(DeskmindError::Config(
                "assistant.poll_max_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.poll_interval_ms == 0 {
            return Err(DeskmindError::Config(
                "assistant.poll_interval_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.max_history_entries == 0 {
            return Err(DeskmindError::Config(
                "session.max_history_entries must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.context_window_exchanges == 0 {
            return Err(DeskmindError::Config(
                "session.context_window_exchanges must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.expiry_days <= 0 {
            return Err(DeskmindError::Config(
                "session.expiry_days must be greater than 0".to_string(),
            )
            .into());
        }

        if self.client.gateway_url.is_empty() {
            return Err(
                DeskmindError::Config("client.gateway_url cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Validate the parts of the configuration the gateway server needs
    ///
    /// The serve command additionally requires the upstream base URL and
    /// vector store identifier, which the chat client does not.
    pub fn validate_for_serve(&self) -> Result<()> {
        self.validate()?;

        if self.assistant.base_url.is_empty() {
            return Err(
                DeskmindError::Config("assistant.base_url cannot be empty".to_string()).into(),
            );
        }

        if self.assistant.vector_store_id.is_empty() {
            return Err(DeskmindError::Config(
                "assistant.vector_store_id cannot be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

/// Resolve the assistant API key
///
/// Checks the `DESKMIND_API_KEY` environment variable first, then falls
/// back to the platform keyring (service "deskmind", entry
/// "assistant_api_key").
///
/// # Errors
///
/// Returns `DeskmindError::MissingApiKey` when neither source holds a
/// key, or a keyring error if the credential store is unavailable.
pub fn resolve_api_key() -> Result<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.trim().is_empty() {
            tracing::debug!("Using assistant API key from environment");
            return Ok(key);
        }
    }

    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_API_KEY_ENTRY)?;
    match entry.get_password() {
        Ok(key) => {
            tracing::debug!("Using assistant API key from keyring");
            Ok(key)
        }
        Err(keyring::Error::NoEntry) => Err(DeskmindError::MissingApiKey.into()),
        Err(e) => Err(DeskmindError::Keyring(e).into()),
    }
}
