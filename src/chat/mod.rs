//! Client-side chat coordination
//!
//! The orchestrator decides session continuation policy, invokes the
//! gateway, and reconciles results into a visible transcript. Failures
//! are converted into assistant-authored transcript messages so the
//! conversation is never left in a broken state.

pub mod orchestrator;
pub mod remote;

pub use orchestrator::Orchestrator;
pub use remote::{Gateway, HttpGateway};

use crate::session::ExchangeMetadata;
use chrono::{DateTime, Utc};
use ulid::Ulid;

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One visible message in the conversation transcript
#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    /// Unique message identifier
    pub id: String,
    /// Message text
    pub content: String,
    /// Who authored the message
    pub sender: Sender,
    /// When the message was added to the transcript
    pub timestamp: DateTime<Utc>,
    /// Upstream identifiers, present on real assistant replies
    pub metadata: Option<ExchangeMetadata>,
}

impl TranscriptMessage {
    /// Build a user-authored message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Build an assistant-authored message
    pub fn assistant(content: impl Into<String>, metadata: Option<ExchangeMetadata>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            metadata,
        }
    }
}
