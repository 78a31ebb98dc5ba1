//! Deskmind - session-aware assistant gateway library
//!
//! This library bridges chat clients to a hosted assistants API while
//! tracking conversation continuity locally.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: In-memory session store and context window rendering
//! - `assistant`: Upstream assistants API client, run polling, and the exchange service
//! - `gateway`: HTTP surface exposing the exchange service
//! - `chat`: Client-side orchestrator reconciling gateway results into a transcript
//! - `storage`: Durable chat mirror for authenticated users
//! - `config`: Configuration management and credential resolution
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use deskmind::config::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     // Gateway or chat wiring would go here
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use assistant::{AssistantService, ExchangeOutcome};
pub use chat::Orchestrator;
pub use config::Config;
pub use error::{DeskmindError, Result};
pub use session::SessionStore;
