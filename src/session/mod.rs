//! Conversation session tracking
//!
//! A session is the local handle correlating one logical conversation to
//! an upstream assistant/thread pair, plus a bounded mirror of the
//! exchange history. Sessions for guests live only in memory; sessions
//! for authenticated users are additionally mirrored to durable chat
//! storage on a best-effort basis by the orchestrator.

pub mod context;
pub mod store;

pub use store::{spawn_cleanup_task, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifiers attached to a completed exchange
///
/// Only these three fields are ever read back, so the metadata is a
/// closed structure rather than an open JSON map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeMetadata {
    /// Upstream assistant identifier used for this exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    /// Upstream thread identifier used for this exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Upstream run identifier that produced the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

/// One user query and the assistant response it produced
///
/// Exchanges are immutable once created and only ever appended to a
/// session's history, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// The user's query text (without any prepended context window)
    pub query: String,

    /// The assistant's response text
    pub response: String,

    /// When the exchange completed
    pub timestamp: DateTime<Utc>,

    /// Upstream identifiers recorded for this exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExchangeMetadata>,
}

/// One logical conversation
///
/// The external binding (`assistant_id` + `thread_id`) is absent until
/// the first gateway round-trip completes; once set it is reused for
/// every later exchange in the session until an explicit new
/// conversation discards the whole session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque, time-sortable session identifier
    pub id: String,

    /// Owning user identifier; `None` marks a guest session
    pub owner: Option<String>,

    /// Upstream assistant identifier, once bound
    pub assistant_id: Option<String>,

    /// Upstream thread identifier, once bound
    pub thread_id: Option<String>,

    /// Ordered exchange history, bounded by the store
    pub history: Vec<Exchange>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Last exchange or binding update; drives expiry
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create an empty session owned by `owner`
    pub fn new(owner: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            owner: owner.map(|o| o.to_string()),
            assistant_id: None,
            thread_id: None,
            history: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Returns true when both upstream identifiers are set
    ///
    /// A bound session instructs the gateway to reuse its existing
    /// assistant and thread instead of creating fresh ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use deskmind::session::Session;
    ///
    /// let mut session = Session::new(None);
    /// assert!(!session.is_bound());
    ///
    /// session.assistant_id = Some("asst_1".to_string());
    /// session.thread_id = Some("thread_1".to_string());
    /// assert!(session.is_bound());
    /// ```
    pub fn is_bound(&self) -> bool {
        self.assistant_id.is_some() && self.thread_id.is_some()
    }

    /// Returns true when the session has no owning user
    pub fn is_guest(&self) -> bool {
        self.owner.is_none()
    }
}
