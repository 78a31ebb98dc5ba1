//! Assistant exchange service
//!
//! Implements the full bridge for one chat request: resolve (create or
//! reuse) the assistant and thread, append the user message, start a
//! run, poll it to completion, and extract the newest assistant reply.
//!
//! Every resource created here is real remote state. A crash mid-poll
//! leaves an orphaned thread and run upstream; threads are cheap and
//! idempotent to abandon, so there is no compensating cleanup.

use crate::assistant::client::{AssistantClient, MessageList};
use crate::assistant::poll::RunPoller;
use crate::config::AssistantConfig;
use crate::error::{DeskmindError, Result};
use crate::prompts::assistant_instructions;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Result of one successful exchange
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    /// Assistant response text
    pub response: String,
    /// Assistant identifier used (fresh or reused)
    pub assistant_id: String,
    /// Thread identifier used (fresh or reused)
    pub thread_id: String,
    /// Run identifier that produced the response
    pub run_id: String,
    /// When the exchange completed
    pub timestamp: DateTime<Utc>,
    /// Whether the caller asked to continue an existing session
    pub session_continued: bool,
}

/// Bridges one chat request to the upstream assistants API
///
/// The service holds no per-request state; each call to [`exchange`]
/// is independent, so one instance can serve concurrent requests.
///
/// [`exchange`]: AssistantService::exchange
pub struct AssistantService {
    client: AssistantClient,
    poller: RunPoller,
    config: AssistantConfig,
}

impl AssistantService {
    /// Create a service against the configured upstream
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: AssistantConfig, api_key: String) -> Result<Self> {
        let client = AssistantClient::new(&config, api_key)?;
        let poller = RunPoller::from_config(&config);
        Ok(Self {
            client,
            poller,
            config,
        })
    }

    /// Perform one exchange against the upstream API
    ///
    /// # Arguments
    ///
    /// * `message` - Outbound message text (context window already applied)
    /// * `assistant_id` - Existing assistant to reuse, if continuing
    /// * `thread_id` - Existing thread to reuse, if continuing
    /// * `continue_session` - Reuse the supplied identifiers instead of creating fresh ones
    /// * `cancel` - Cancellation token honored at every polling iteration
    ///
    /// # Errors
    ///
    /// Surfaces the gateway error taxonomy unchanged: `UpstreamRequest`
    /// for non-2xx sub-calls, `RunTimeout`/`RunFailed` from polling, and
    /// `EmptyResponse` when no assistant message exists after a
    /// completed run. Nothing is retried here; retry is a caller
    /// decision.
    pub async fn exchange(
        &self,
        message: &str,
        assistant_id: Option<&str>,
        thread_id: Option<&str>,
        continue_session: bool,
        cancel: &CancellationToken,
    ) -> Result<ExchangeOutcome> {
        // Step 1: create or reuse the assistant
        let assistant_id = match assistant_id {
            Some(id) if continue_session => {
                tracing::debug!(assistant_id = %id, "Reusing assistant");
                id.to_string()
            }
            _ => {
                self.client
                    .create_assistant(
                        &self.config.assistant_name,
                        assistant_instructions(),
                        &self.config.model,
                        &self.config.vector_store_id,
                    )
                    .await?
                    .id
            }
        };

        // Step 2: create or reuse the thread
        let thread_id = match thread_id {
            Some(id) if continue_session => {
                tracing::debug!(thread_id = %id, "Continuing thread");
                id.to_string()
            }
            _ => self.client.create_thread().await?.id,
        };

        // Step 3: append the user message
        self.client.add_message(&thread_id, message).await?;

        // Step 4: start the run
        let run = self.client.create_run(&thread_id, &assistant_id).await?;
        let run_id = run.id;

        // Step 5: poll to completion
        self.poller
            .wait_for_completion(&self.client, &thread_id, &run_id, run.status, cancel)
            .await?;

        // Step 6: extract the newest assistant reply
        let messages = self.client.list_messages(&thread_id).await?;
        let response = latest_assistant_text(&messages)
            .ok_or(DeskmindError::EmptyResponse)?
            .to_string();

        tracing::info!(
            %assistant_id,
            %thread_id,
            %run_id,
            response_chars = response.len(),
            "Assistant exchange completed"
        );

        Ok(ExchangeOutcome {
            response,
            assistant_id,
            thread_id,
            run_id,
            timestamp: Utc::now(),
            session_continued: continue_session,
        })
    }
}

/// Text of the most recently created assistant message, if any
///
/// The upstream returns messages newest-first; `created_at` breaks
/// ties explicitly so reordering upstream cannot change the result.
fn latest_assistant_text(messages: &MessageList) -> Option<&str> {
    let mut best: Option<&crate::assistant::client::ThreadMessage> = None;
    for message in &messages.data {
        if message.role != "assistant" {
            continue;
        }
        if best.map_or(true, |b| message.created_at > b.created_at) {
            best = Some(message);
        }
    }
    best.and_then(|m| m.text())
}
