use crate::session::ExchangeMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author role of a durable chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Stable string form used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    /// Parse the database string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A durable chat owned by an authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Unique chat identifier
    pub id: String,
    /// Owning user identifier
    pub user_id: String,
    /// Display title, clamped at creation
    pub title: String,
    /// When the chat was created
    pub created_at: DateTime<Utc>,
    /// Bumped whenever a message is added or the title changes
    pub updated_at: DateTime<Utc>,
}

/// One durable chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier (time-sortable)
    pub id: String,
    /// Owning chat identifier
    pub chat_id: String,
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When the message was stored
    pub timestamp: DateTime<Utc>,
    /// Upstream identifiers, present on real assistant replies
    pub metadata: Option<ExchangeMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(MessageRole::parse("user"), Some(MessageRole::User));
        assert_eq!(MessageRole::parse("assistant"), Some(MessageRole::Assistant));
        assert_eq!(MessageRole::parse("system"), None);
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
    }
}
