//! In-memory session repository
//!
//! Tracks zero or more sessions keyed by identifier plus a "current"
//! pointer. The store is an explicitly constructed value that callers
//! pass down (no global singleton), scoped to the process. Durable
//! mirroring for authenticated users happens elsewhere and never blocks
//! the in-memory update.

use crate::config::SessionConfig;
use crate::error::{DeskmindError, Result};
use crate::session::context::build_context_window;
use crate::session::{Exchange, ExchangeMetadata, Session};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory map of conversation sessions with a current pointer
///
/// All operations are pure in-memory mutations with no I/O failure
/// modes. The only fallible operation is `set_current_session`, which
/// reports unknown identifiers instead of silently ignoring them.
///
/// # Examples
///
/// ```
/// use deskmind::config::SessionConfig;
/// use deskmind::session::SessionStore;
///
/// let mut store = SessionStore::new(SessionConfig::default());
/// let id = store.create_session(Some("user-1")).id.clone();
/// assert_eq!(store.current_session().unwrap().id, id);
/// ```
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    current: Option<String>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create an empty store with the given behavior settings
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            current: None,
            config,
        }
    }

    /// Allocate a new session and make it current
    ///
    /// # Arguments
    ///
    /// * `owner` - Owning user identifier; `None` creates a guest session
    pub fn create_session(&mut self, owner: Option<&str>) -> &Session {
        let session = Session::new(owner);
        let id = session.id.clone();
        tracing::debug!(session_id = %id, guest = session.is_guest(), "Created session");
        self.sessions.insert(id.clone(), session);
        self.current = Some(id.clone());
        // Just inserted under this key
        &self.sessions[&id]
    }

    /// The session the current pointer refers to, if any
    pub fn current_session(&self) -> Option<&Session> {
        self.current
            .as_ref()
            .and_then(|id| self.sessions.get(id))
    }

    /// Look up a session by identifier
    pub fn get_session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// All sessions, most recently active first
    pub fn sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        sessions
    }

    /// Point the store at an existing session
    ///
    /// # Errors
    ///
    /// Returns `DeskmindError::SessionNotFound` for an unknown
    /// identifier; callers decide whether that is fatal.
    pub fn set_current_session(&mut self, id: &str) -> Result<()> {
        if !self.sessions.contains_key(id) {
            return Err(DeskmindError::SessionNotFound(id.to_string()).into());
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    /// Append an exchange to the current session's history
    ///
    /// Creates a fresh guest session on the fly when no session is
    /// current. History is truncated to the configured maximum, keeping
    /// the most recent entries, and `last_activity` is bumped.
    pub fn add_exchange(
        &mut self,
        query: impl Into<String>,
        response: impl Into<String>,
        metadata: Option<ExchangeMetadata>,
    ) {
        if self.current_session().is_none() {
            self.create_session(None);
        }

        let max_entries = self.config.max_history_entries;
        let id = match &self.current {
            Some(id) => id.clone(),
            None => return,
        };
        if let Some(session) = self.sessions.get_mut(&id) {
            session.history.push(Exchange {
                query: query.into(),
                response: response.into(),
                timestamp: Utc::now(),
                metadata,
            });

            if session.history.len() > max_entries {
                let excess = session.history.len() - max_entries;
                session.history.drain(..excess);
            }

            session.last_activity = Utc::now();
        }
    }

    /// Set or overwrite the current session's upstream binding
    ///
    /// Re-setting an unchanged binding is allowed and idempotent; the
    /// orchestrator calls this after every successful exchange. No-op
    /// when no session is current.
    pub fn update_binding(&mut self, assistant_id: &str, thread_id: &str) {
        let id = match &self.current {
            Some(id) => id.clone(),
            None => return,
        };

        if let Some(session) = self.sessions.get_mut(&id) {
            session.assistant_id = Some(assistant_id.to_string());
            session.thread_id = Some(thread_id.to_string());
            session.last_activity = Utc::now();
        }
    }

    /// Render the current session's context window
    ///
    /// Returns `None` when there is no current session or its history
    /// is empty. See [`build_context_window`] for the format.
    pub fn context_window(&self) -> Option<String> {
        let session = self.current_session()?;
        build_context_window(
            &session.history,
            self.config.context_window_exchanges,
            self.config.context_response_budget,
        )
    }

    /// Remove sessions idle longer than the configured expiry
    ///
    /// Intended to run on a periodic timer, not on every operation.
    ///
    /// # Returns
    ///
    /// The number of sessions removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let cutoff = Utc::now() - Duration::days(self.config.expiry_days);
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.last_activity < cutoff)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.sessions.remove(id);
            if self.current.as_deref() == Some(id) {
                self.current = None;
            }
        }

        if !expired.is_empty() {
            tracing::info!(removed = expired.len(), "Expired idle sessions");
        }

        expired.len()
    }

    /// Delete a session by identifier
    ///
    /// Clears the current pointer when it referred to the deleted
    /// session. Returns whether a session was actually removed.
    pub fn delete_session(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed && self.current.as_deref() == Some(id) {
            self.current = None;
        }
        removed
    }

    /// Delete the current session and clear the pointer
    pub fn clear_current_session(&mut self) {
        if let Some(id) = self.current.take() {
            self.sessions.remove(&id);
        }
    }

    /// Number of tracked sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true when no sessions are tracked
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Spawn the periodic expiry sweep for a shared store
///
/// Runs `cleanup_expired` every `session.cleanup_interval_secs`
/// seconds until the returned handle is aborted or dropped with the
/// runtime.
pub fn spawn_cleanup_task(
    store: Arc<Mutex<SessionStore>>,
    period: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; skip it so a fresh store
        // is not swept at startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            match store.lock() {
                Ok(mut store) => {
                    let removed = store.cleanup_expired();
                    tracing::debug!(removed, "Session expiry sweep finished");
                }
                Err(_) => {
                    tracing::warn!("Session store lock poisoned, skipping sweep");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default())
    }

    fn store_with(max_history: usize) -> SessionStore {
        SessionStore::new(SessionConfig {
            max_history_entries: max_history,
            ..SessionConfig::default()
        })
    }

    #[test]
    fn test_create_session_becomes_current() {
        let mut store = store();
        let id = store.create_session(Some("user-1")).id.clone();
        assert_eq!(store.current_session().unwrap().id, id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_no_current_session_initially() {
        let store = store();
        assert!(store.current_session().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_current_session_unknown_id_errors() {
        let mut store = store();
        store.create_session(None);

        let err = store.set_current_session("no-such-session").unwrap_err();
        let err = err.downcast_ref::<DeskmindError>().unwrap();
        assert!(matches!(err, DeskmindError::SessionNotFound(_)));
    }

    #[test]
    fn test_set_current_session_switches() {
        let mut store = store();
        let first = store.create_session(None).id.clone();
        let second = store.create_session(None).id.clone();
        assert_eq!(store.current_session().unwrap().id, second);

        store.set_current_session(&first).unwrap();
        assert_eq!(store.current_session().unwrap().id, first);
    }

    #[test]
    fn test_add_exchange_appends_in_order() {
        let mut store = store();
        store.create_session(None);

        for i in 0..5 {
            store.add_exchange(format!("q{}", i), format!("r{}", i), None);
        }

        let history = &store.current_session().unwrap().history;
        assert_eq!(history.len(), 5);
        for (i, entry) in history.iter().enumerate() {
            assert_eq!(entry.query, format!("q{}", i));
            assert_eq!(entry.response, format!("r{}", i));
        }
    }

    #[test]
    fn test_add_exchange_without_session_creates_guest() {
        let mut store = store();
        store.add_exchange("hello", "hi", None);

        let session = store.current_session().unwrap();
        assert!(session.is_guest());
        assert_eq!(session.history.len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut store = store_with(3);
        store.create_session(None);

        for i in 0..10 {
            store.add_exchange(format!("q{}", i), format!("r{}", i), None);
        }

        let history = &store.current_session().unwrap().history;
        assert_eq!(history.len(), 3);
        // Most recent entries survive
        assert_eq!(history[0].query, "q7");
        assert_eq!(history[2].query, "q9");
    }

    #[test]
    fn test_update_binding_sets_and_overwrites() {
        let mut store = store();
        store.create_session(None);

        store.update_binding("asst_1", "thread_1");
        let session = store.current_session().unwrap();
        assert_eq!(session.assistant_id.as_deref(), Some("asst_1"));
        assert_eq!(session.thread_id.as_deref(), Some("thread_1"));

        // Idempotent re-set with the same values
        store.update_binding("asst_1", "thread_1");
        assert!(store.current_session().unwrap().is_bound());

        store.update_binding("asst_2", "thread_2");
        let session = store.current_session().unwrap();
        assert_eq!(session.assistant_id.as_deref(), Some("asst_2"));
    }

    #[test]
    fn test_update_binding_without_session_is_noop() {
        let mut store = store();
        store.update_binding("asst_1", "thread_1");
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_expired_removes_old_keeps_recent() {
        let mut store = store();

        let old_id = store.create_session(None).id.clone();
        let fresh_id = store.create_session(None).id.clone();

        // Backdate the first session past the 7-day threshold, the
        // second by only an hour.
        store
            .sessions
            .get_mut(&old_id)
            .unwrap()
            .last_activity = Utc::now() - Duration::days(8);
        store
            .sessions
            .get_mut(&fresh_id)
            .unwrap()
            .last_activity = Utc::now() - Duration::hours(1);

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert!(store.get_session(&old_id).is_none());
        assert!(store.get_session(&fresh_id).is_some());
    }

    #[test]
    fn test_cleanup_expired_clears_current_pointer() {
        let mut store = store();
        let id = store.create_session(None).id.clone();
        store.sessions.get_mut(&id).unwrap().last_activity = Utc::now() - Duration::days(30);

        store.cleanup_expired();
        assert!(store.current_session().is_none());
    }

    #[test]
    fn test_context_window_empty_history() {
        let mut store = store();
        store.create_session(None);
        assert!(store.context_window().is_none());
    }

    #[test]
    fn test_context_window_renders_last_three() {
        let mut store = store();
        store.create_session(None);
        for i in 0..5 {
            store.add_exchange(format!("q{}", i), format!("r{}", i), None);
        }

        let window = store.context_window().unwrap();
        assert!(!window.contains("q1"));
        assert!(window.contains("User: q2"));
        assert!(window.contains("Assistant: r4"));
    }

    #[test]
    fn test_delete_session_clears_current() {
        let mut store = store();
        let id = store.create_session(None).id.clone();

        assert!(store.delete_session(&id));
        assert!(store.current_session().is_none());
        assert!(!store.delete_session(&id));
    }

    #[test]
    fn test_clear_current_session() {
        let mut store = store();
        store.create_session(None);
        store.add_exchange("q", "r", None);

        store.clear_current_session();
        assert!(store.current_session().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_sorted_by_recent_activity() {
        let mut store = store();
        let first = store.create_session(None).id.clone();
        let second = store.create_session(None).id.clone();

        // Make the first session the most recently active
        store.sessions.get_mut(&first).unwrap().last_activity = Utc::now() + Duration::seconds(5);

        let ordered = store.sessions();
        assert_eq!(ordered[0].id, first);
        assert_eq!(ordered[1].id, second);
    }
}
