//! Gateway client abstraction
//!
//! The orchestrator talks to the gateway through the [`Gateway`] trait
//! so tests can substitute a mock. The production implementation posts
//! to the served HTTP endpoint using the same wire types the server
//! handler consumes.

use crate::error::{DeskmindError, Result};
use crate::gateway::{AssistantRequest, AssistantResponse, ErrorBody};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

#[cfg(test)]
use mockall::automock;

/// One-shot chat transport to the assistant gateway
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Submit one chat request on behalf of `user_id`
    ///
    /// # Errors
    ///
    /// Returns a gateway or transport error; implementations never
    /// retry internally.
    async fn send(&self, user_id: &str, request: &AssistantRequest) -> Result<AssistantResponse>;
}

/// HTTP gateway client
///
/// # Examples
///
/// ```
/// use deskmind::chat::HttpGateway;
///
/// let gateway = HttpGateway::new("http://127.0.0.1:8787/v1/assistant", 120);
/// assert!(gateway.is_ok());
/// ```
#[derive(Debug)]
pub struct HttpGateway {
    http: Client,
    endpoint: Url,
}

impl HttpGateway {
    /// Create a client for the given assistant endpoint URL
    ///
    /// # Errors
    ///
    /// Returns error when the URL does not parse or the HTTP client
    /// cannot be constructed.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DeskmindError::Config(format!("Invalid gateway URL: {}", e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("deskmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeskmindError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn send(&self, user_id: &str, request: &AssistantRequest) -> Result<AssistantResponse> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("user-id", user_id)
            .json(request)
            .send()
            .await
            .map_err(DeskmindError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The gateway reports failures as { error, details }; fall
            // back to the raw body for anything else.
            let details = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.details)
                .unwrap_or(body);
            tracing::warn!(%status, "Gateway request failed: {}", details);
            return Err(DeskmindError::Gateway(details).into());
        }

        let reply: AssistantResponse = response.json().await.map_err(DeskmindError::Http)?;
        if reply.response.is_empty() {
            return Err(DeskmindError::EmptyResponse.into());
        }
        Ok(reply)
    }
}
