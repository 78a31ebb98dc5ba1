//! Chat orchestration
//!
//! Coordinates one user's conversation: ensures a session exists,
//! decides whether to continue the bound assistant/thread pair, invokes
//! the gateway, and reconciles the outcome into the transcript and the
//! session store. For authenticated users every exchange is also
//! mirrored to durable chat storage on a best-effort basis.

use crate::chat::remote::Gateway;
use crate::chat::{Sender, TranscriptMessage};
use crate::error::{DeskmindError, Result};
use crate::gateway::AssistantRequest;
use crate::session::{ExchangeMetadata, SessionStore};
use crate::storage::{ChatStorage, MessageRole};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shown when the gateway reports a missing or broken configuration
pub const CONFIG_ERROR_MESSAGE: &str =
    "The assistant service is not configured. Please contact an administrator.";

/// Shown for transient upstream problems worth retrying
pub const TRANSIENT_ERROR_MESSAGE: &str =
    "I'm having trouble connecting to the assistant service right now. Please try again.";

/// Shown for anything else
pub const GENERIC_ERROR_MESSAGE: &str =
    "Sorry, I ran into a problem while processing your message. Please try again.";

/// User identifier used for guest conversations
pub const ANONYMOUS_USER: &str = "anonymous";

/// Client-side conversation coordinator
///
/// Per-session state machine: a fresh session is unbound; the first
/// successful exchange binds it to an assistant/thread pair, which
/// every later exchange reuses. The only way back to an unbound state
/// is an explicit new conversation, which discards the old session
/// entirely.
pub struct Orchestrator {
    gateway: Arc<dyn Gateway>,
    store: Arc<Mutex<SessionStore>>,
    storage: Option<Arc<ChatStorage>>,
    user_id: String,
    transcript: Vec<TranscriptMessage>,
    current_chat_id: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator for one user
    ///
    /// # Arguments
    ///
    /// * `gateway` - Transport to the assistant gateway
    /// * `store` - Shared session store
    /// * `storage` - Durable chat storage; `None` disables mirroring
    /// * `user_id` - Current user, or "anonymous" for guests
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<Mutex<SessionStore>>,
        storage: Option<Arc<ChatStorage>>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            store,
            storage,
            user_id: user_id.into(),
            transcript: Vec::new(),
            current_chat_id: None,
        }
    }

    /// The visible conversation transcript
    pub fn transcript(&self) -> &[TranscriptMessage] {
        &self.transcript
    }

    /// Whether the current user is authenticated
    pub fn is_authenticated(&self) -> bool {
        self.user_id != ANONYMOUS_USER
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, SessionStore>> {
        self.store
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))
    }

    /// Send one message and reconcile the outcome into the transcript
    ///
    /// On gateway success the exchange is appended to the session store
    /// (idempotently re-setting the binding) and mirrored to durable
    /// storage for authenticated users. On failure the error is
    /// classified into a user-facing string and emitted as an
    /// assistant-authored message; no raw error escapes to the caller.
    ///
    /// # Returns
    ///
    /// The assistant-authored transcript message that was emitted,
    /// whether a real reply or a classified failure notice.
    ///
    /// # Errors
    ///
    /// Only `EmptyMessage` (blank input) is reported as an error.
    pub async fn send_message(&mut self, content: &str) -> Result<TranscriptMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DeskmindError::EmptyMessage.into());
        }

        self.transcript.push(TranscriptMessage::user(content));

        // Snapshot the continuation decision under one lock acquisition.
        let (assistant_id, thread_id, continue_session, context) = {
            let mut store = self.lock_store()?;
            if store.current_session().is_none() {
                let owner = if self.is_authenticated() {
                    Some(self.user_id.as_str())
                } else {
                    None
                };
                store.create_session(owner);
            }
            let context = store.context_window();
            let session = store.current_session().ok_or_else(|| {
                anyhow::anyhow!("session disappeared while preparing request")
            })?;
            (
                session.assistant_id.clone(),
                session.thread_id.clone(),
                session.is_bound(),
                context,
            )
        };

        let outbound = match &context {
            Some(window) => format!(
                "Previous conversation context:\n{}\n\nCurrent query: {}",
                window, content
            ),
            None => content.to_string(),
        };

        let request = AssistantRequest {
            message: outbound,
            file_ids: Vec::new(),
            assistant_id: if continue_session { assistant_id } else { None },
            thread_id: if continue_session { thread_id } else { None },
            continue_session,
        };

        match self.gateway.send(&self.user_id, &request).await {
            Ok(reply) => {
                let metadata = ExchangeMetadata {
                    assistant_id: Some(reply.assistant_id.clone()),
                    thread_id: Some(reply.thread_id.clone()),
                    run_id: Some(reply.run_id.clone()),
                };

                {
                    let mut store = self.lock_store()?;
                    store.update_binding(&reply.assistant_id, &reply.thread_id);
                    store.add_exchange(content, &reply.response, Some(metadata.clone()));
                }

                self.mirror_exchange(content, &reply.response, &metadata);

                let message = TranscriptMessage::assistant(reply.response, Some(metadata));
                self.transcript.push(message.clone());
                Ok(message)
            }
            Err(err) => {
                tracing::warn!(user_id = %self.user_id, "Chat send failed: {}", err);
                let text = classify_error(&err);
                self.mirror_failure_notice(text);

                let message = TranscriptMessage::assistant(text, None);
                self.transcript.push(message.clone());
                Ok(message)
            }
        }
    }

    /// Resubmit the most recent user message
    ///
    /// Discards the assistant message that followed it (if any) before
    /// resending with the same continuation policy. Returns `None` when
    /// the transcript holds no user message to retry.
    pub async fn retry_last_message(&mut self) -> Result<Option<TranscriptMessage>> {
        let index = match self
            .transcript
            .iter()
            .rposition(|m| m.sender == Sender::User)
        {
            Some(index) => index,
            None => return Ok(None),
        };

        let content = self.transcript[index].content.clone();
        // Drop the user message and everything after it; send_message
        // re-appends the user message itself.
        self.transcript.truncate(index);

        let message = self.send_message(&content).await?;
        Ok(Some(message))
    }

    /// Start a fresh conversation
    ///
    /// Allocates a new, unbound session and clears the transcript. The
    /// old session keeps its bindings but is left behind for the expiry
    /// sweep (or an explicit delete); there is no in-place unbinding.
    pub fn start_new_conversation(&mut self) {
        self.transcript.clear();
        self.current_chat_id = None;
        if let Ok(mut store) = self.store.lock() {
            let owner = if self.is_authenticated() {
                Some(self.user_id.clone())
            } else {
                None
            };
            store.create_session(owner.as_deref());
        }
    }

    /// Load an existing conversation into the transcript
    ///
    /// Guests load from the in-memory session store; authenticated
    /// users load from durable chat storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound` for an unknown session identifier, or
    /// a storage error for authenticated loads.
    pub fn load_conversation(&mut self, id: &str) -> Result<()> {
        if self.is_authenticated() {
            let storage = self
                .storage
                .as_ref()
                .ok_or_else(|| DeskmindError::Storage("chat storage unavailable".to_string()))?;

            let messages = storage.chat_messages(id)?;
            self.transcript = messages
                .into_iter()
                .map(|m| TranscriptMessage {
                    id: m.id,
                    content: m.content,
                    sender: match m.role {
                        MessageRole::User => Sender::User,
                        MessageRole::Assistant => Sender::Assistant,
                    },
                    timestamp: m.timestamp,
                    metadata: m.metadata,
                })
                .collect();
            self.current_chat_id = Some(id.to_string());
        } else {
            let mut store = self.lock_store()?;
            store.set_current_session(id)?;
            let session = store
                .get_session(id)
                .ok_or_else(|| DeskmindError::SessionNotFound(id.to_string()))?;

            let transcript = session
                .history
                .iter()
                .flat_map(|entry| {
                    [
                        TranscriptMessage {
                            id: ulid::Ulid::new().to_string(),
                            content: entry.query.clone(),
                            sender: Sender::User,
                            timestamp: entry.timestamp,
                            metadata: None,
                        },
                        TranscriptMessage {
                            id: ulid::Ulid::new().to_string(),
                            content: entry.response.clone(),
                            sender: Sender::Assistant,
                            timestamp: entry.timestamp,
                            metadata: entry.metadata.clone(),
                        },
                    ]
                })
                .collect();
            drop(store);
            self.transcript = transcript;
        }

        Ok(())
    }

    /// Mirror a successful exchange to durable storage, best-effort
    ///
    /// Failures are logged and swallowed; the in-memory state is
    /// already updated and must not be rolled back.
    fn mirror_exchange(&mut self, query: &str, response: &str, metadata: &ExchangeMetadata) {
        if !self.is_authenticated() {
            return;
        }
        let storage = match &self.storage {
            Some(storage) => Arc::clone(storage),
            None => return,
        };

        let chat_id = match &self.current_chat_id {
            Some(id) => id.clone(),
            None => match storage.create_chat(&self.user_id, query) {
                Ok(chat) => {
                    self.current_chat_id = Some(chat.id.clone());
                    chat.id
                }
                Err(err) => {
                    tracing::warn!("Failed to create durable chat: {}", err);
                    return;
                }
            },
        };

        if let Err(err) = storage.add_message(&chat_id, MessageRole::User, query, None) {
            tracing::warn!("Failed to mirror user message: {}", err);
            return;
        }
        if let Err(err) = storage.add_message(
            &chat_id,
            MessageRole::Assistant,
            response,
            Some(metadata.clone()),
        ) {
            tracing::warn!("Failed to mirror assistant message: {}", err);
        }
    }

    /// Mirror a failure notice into an already-open durable chat
    fn mirror_failure_notice(&self, content: &str) {
        let (storage, chat_id) = match (&self.storage, &self.current_chat_id) {
            (Some(storage), Some(chat_id)) if self.is_authenticated() => (storage, chat_id),
            _ => return,
        };
        if let Err(err) = storage.add_message(chat_id, MessageRole::Assistant, content, None) {
            tracing::warn!("Failed to mirror failure notice: {}", err);
        }
    }
}

/// Map an error to one of the user-facing message strings
///
/// Timeouts and terminal run failures read the same as any other
/// upstream problem to the end user; they are only distinguished in
/// logs and metrics.
pub fn classify_error(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<DeskmindError>() {
        Some(DeskmindError::Config(_)) | Some(DeskmindError::MissingApiKey) => {
            CONFIG_ERROR_MESSAGE
        }
        Some(DeskmindError::Gateway(details)) if details.contains("not configured") => {
            CONFIG_ERROR_MESSAGE
        }
        Some(DeskmindError::UpstreamRequest { .. })
        | Some(DeskmindError::RunTimeout { .. })
        | Some(DeskmindError::RunFailed { .. })
        | Some(DeskmindError::Gateway(_))
        | Some(DeskmindError::Http(_)) => TRANSIENT_ERROR_MESSAGE,
        _ => GENERIC_ERROR_MESSAGE,
    }
}
