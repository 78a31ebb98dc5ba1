//! Error types for Deskmind
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Deskmind operations
///
/// This enum encompasses all possible errors that can occur while
/// bridging chat requests to the upstream assistants API, managing
/// conversation sessions, and mirroring conversations to durable storage.
#[derive(Error, Debug)]
pub enum DeskmindError {
    /// Configuration-related errors (bad file, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The assistant API credential could not be resolved
    #[error("Assistant API key not configured")]
    MissingApiKey,

    /// A sub-call to the upstream assistants API returned a non-2xx status
    #[error("Upstream request failed with status {status}: {body}")]
    UpstreamRequest {
        /// HTTP status code returned by the upstream API
        status: u16,
        /// Response body returned alongside the error status
        body: String,
    },

    /// Run polling exhausted its attempt budget without reaching a terminal state
    #[error("Assistant run timed out after {attempts} polling attempts")]
    RunTimeout {
        /// Number of polling attempts performed before giving up
        attempts: u32,
    },

    /// The run reached a terminal state other than "completed"
    #[error("Assistant run ended with status: {status}")]
    RunFailed {
        /// The terminal run status reported by the upstream API
        status: String,
    },

    /// The thread contained no assistant message after a completed run
    #[error("No assistant response found in thread")]
    EmptyResponse,

    /// The request was cancelled before the run finished
    #[error("Assistant request cancelled")]
    Cancelled,

    /// An outbound message was empty after trimming
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// A session lookup referenced an unknown session identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The gateway endpoint rejected or failed a chat request
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Durable chat storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Deskmind operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
