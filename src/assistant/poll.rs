//! Run completion polling
//!
//! Drives a run to a terminal state by polling its status on a fixed
//! interval with a bounded attempt budget. Cancellation is first-class:
//! the token is honored at every iteration, so an abandoned request
//! stops polling instead of burning its full attempt budget.

use crate::assistant::client::{AssistantClient, RunStatus};
use crate::error::{DeskmindError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Polls a run until it reaches a terminal state
///
/// Distinguishes two failure shapes: a run that settles in a terminal
/// state other than `completed` raises `RunFailed`, while a run still
/// pending after the attempt budget raises `RunTimeout`.
#[derive(Debug, Clone, Copy)]
pub struct RunPoller {
    interval: Duration,
    max_attempts: u32,
}

impl RunPoller {
    /// Create a poller with an explicit interval and attempt budget
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use deskmind::assistant::RunPoller;
    ///
    /// let poller = RunPoller::new(Duration::from_secs(2), 30);
    /// assert_eq!(poller.max_attempts(), 30);
    /// ```
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Build a poller from assistant configuration
    pub fn from_config(config: &crate::config::AssistantConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            config.poll_max_attempts,
        )
    }

    /// The configured attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The configured polling interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for a run to complete
    ///
    /// # Arguments
    ///
    /// * `client` - Upstream API client used to refresh run state
    /// * `thread_id` - Thread the run belongs to
    /// * `run_id` - Run to poll
    /// * `initial` - Status reported when the run was created
    /// * `cancel` - Cancellation token checked before every sleep
    ///
    /// # Errors
    ///
    /// * `RunFailed` when the run settles in a non-completed terminal state
    /// * `RunTimeout` when the attempt budget is exhausted while pending
    /// * `Cancelled` when the token fires mid-poll
    /// * Upstream errors from status refresh requests propagate unchanged
    pub async fn wait_for_completion(
        &self,
        client: &AssistantClient,
        thread_id: &str,
        run_id: &str,
        initial: RunStatus,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut status = initial;
        let mut attempts: u32 = 0;

        loop {
            match status {
                RunStatus::Completed => {
                    tracing::debug!(run_id, attempts, "Run completed");
                    return Ok(());
                }
                s if s.is_pending() => {}
                other => {
                    metrics::increment_counter!("assistant_run_failures_total");
                    return Err(DeskmindError::RunFailed {
                        status: other.to_string(),
                    }
                    .into());
                }
            }

            if attempts >= self.max_attempts {
                tracing::warn!(run_id, attempts, "Run polling attempt budget exhausted");
                metrics::increment_counter!("assistant_run_timeouts_total");
                return Err(DeskmindError::RunTimeout { attempts }.into());
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(run_id, "Run polling cancelled");
                    return Err(DeskmindError::Cancelled.into());
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            status = client.get_run(thread_id, run_id).await?.status;
            attempts += 1;
            metrics::increment_counter!("assistant_run_polls_total");
            tracing::debug!(run_id, %status, attempts, "Polled run status");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssistantConfig;

    #[test]
    fn test_from_config() {
        let config = AssistantConfig {
            poll_interval_ms: 250,
            poll_max_attempts: 4,
            ..Default::default()
        };
        let poller = RunPoller::from_config(&config);
        assert_eq!(poller.interval(), Duration::from_millis(250));
        assert_eq!(poller.max_attempts(), 4);
    }

    #[tokio::test]
    async fn test_initially_completed_run_returns_immediately() {
        // No upstream calls happen when the initial status is terminal,
        // so a client pointed at an unroutable address is safe here.
        let config = AssistantConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = AssistantClient::new(&config, "key".to_string()).unwrap();
        let poller = RunPoller::new(Duration::from_millis(1), 3);
        let cancel = CancellationToken::new();

        let result = poller
            .wait_for_completion(&client, "thread_1", "run_1", RunStatus::Completed, &cancel)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_initially_failed_run_raises_run_failed() {
        let config = AssistantConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = AssistantClient::new(&config, "key".to_string()).unwrap();
        let poller = RunPoller::new(Duration::from_millis(1), 3);
        let cancel = CancellationToken::new();

        let err = poller
            .wait_for_completion(&client, "thread_1", "run_1", RunStatus::Failed, &cancel)
            .await
            .unwrap_err();
        let err = err.downcast_ref::<DeskmindError>().unwrap();
        assert!(matches!(err, DeskmindError::RunFailed { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_polling() {
        let config = AssistantConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = AssistantClient::new(&config, "key".to_string()).unwrap();
        let poller = RunPoller::new(Duration::from_secs(60), 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = poller
            .wait_for_completion(&client, "thread_1", "run_1", RunStatus::Queued, &cancel)
            .await
            .unwrap_err();
        let err = err.downcast_ref::<DeskmindError>().unwrap();
        assert!(matches!(err, DeskmindError::Cancelled));
    }
}
