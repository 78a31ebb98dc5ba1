//! HTTP client for the upstream assistants API
//!
//! Thin typed wrapper over the Azure-style OpenAI Assistants resources:
//! assistants, threads, thread messages, and runs. Every request carries
//! the `api-key` header and an `api-version` query parameter. Non-2xx
//! responses surface as `UpstreamRequest` errors carrying the status and
//! body; the client never retries.

use crate::config::AssistantConfig;
use crate::error::{DeskmindError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream assistant resource (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantResource {
    /// Upstream-assigned assistant identifier
    pub id: String,
}

/// Upstream thread resource
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadResource {
    /// Upstream-assigned thread identifier
    pub id: String,
}

/// Upstream run resource
#[derive(Debug, Clone, Deserialize)]
pub struct RunResource {
    /// Upstream-assigned run identifier
    pub id: String,
    /// Current run status
    pub status: RunStatus,
}

/// Lifecycle states of a run
///
/// A run moves through `queued` and `in_progress` before settling in a
/// terminal state. Only `completed` counts as success; every other
/// terminal state fails the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    /// Any status value this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns true while the run is still making progress
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Message listing for a thread
#[derive(Debug, Clone, Deserialize)]
pub struct MessageList {
    /// Messages, newest first as returned by the upstream API
    pub data: Vec<ThreadMessage>,
}

/// One message inside a thread
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadMessage {
    /// Upstream message identifier
    pub id: String,
    /// Author role ("user" or "assistant")
    pub role: String,
    /// Content parts; assistant replies carry a text part
    #[serde(default)]
    pub content: Vec<ContentPart>,
    /// Creation time as a unix timestamp
    #[serde(default)]
    pub created_at: i64,
}

impl ThreadMessage {
    /// First text value in the message content, if any
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find_map(|part| part.text.as_ref().map(|t| t.value.as_str()))
    }
}

/// One content part of a thread message
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    /// Part type, e.g. "text"
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Text payload when `kind` is "text"
    #[serde(default)]
    pub text: Option<TextContent>,
}

/// Text payload of a content part
#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    /// The actual text value
    pub value: String,
}

#[derive(Serialize)]
struct CreateAssistantRequest<'a> {
    instructions: &'a str,
    name: &'a str,
    tools: Vec<ToolSpec>,
    model: &'a str,
    tool_resources: ToolResources<'a>,
}

#[derive(Serialize)]
struct ToolSpec {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ToolResources<'a> {
    file_search: FileSearchResources<'a>,
}

#[derive(Serialize)]
struct FileSearchResources<'a> {
    vector_store_ids: Vec<&'a str>,
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

/// Client for the upstream assistants API
///
/// # Examples
///
/// ```no_run
/// use deskmind::assistant::AssistantClient;
/// use deskmind::config::AssistantConfig;
///
/// # fn main() -> deskmind::error::Result<()> {
/// let config = AssistantConfig {
///     base_url: "https://myaccount.openai.azure.com/openai".to_string(),
///     ..Default::default()
/// };
/// let client = AssistantClient::new(&config, "secret-key".to_string())?;
/// # let _ = client;
/// # Ok(())
/// # }
/// ```
pub struct AssistantClient {
    http: Client,
    base_url: String,
    api_version: String,
    api_key: String,
}

impl AssistantClient {
    /// Create a client against the configured upstream
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("deskmind/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeskmindError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.base_url, path, self.api_version
        )
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(DeskmindError::Http)?;
        self.decode(path, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(DeskmindError::Http)?;
        self.decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, path, "Upstream assistants API returned an error");
            return Err(DeskmindError::UpstreamRequest {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            tracing::error!(path, "Failed to parse upstream response: {}", e);
            DeskmindError::Http(e).into()
        })
    }

    /// Create a new assistant bound to the knowledge corpus
    ///
    /// Assistant creation is expensive and mostly static, so callers
    /// reuse assistants across exchanges whenever a session is bound.
    pub async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        model: &str,
        vector_store_id: &str,
    ) -> Result<AssistantResource> {
        let request = CreateAssistantRequest {
            instructions,
            name,
            tools: vec![ToolSpec {
                kind: "file_search",
            }],
            model,
            tool_resources: ToolResources {
                file_search: FileSearchResources {
                    vector_store_ids: vec![vector_store_id],
                },
            },
        };

        let assistant: AssistantResource = self.post_json("assistants", &request).await?;
        tracing::info!(assistant_id = %assistant.id, "Created assistant");
        Ok(assistant)
    }

    /// Create a new, empty thread
    pub async fn create_thread(&self) -> Result<ThreadResource> {
        let thread: ThreadResource = self
            .post_json("threads", &serde_json::json!({}))
            .await?;
        tracing::info!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    /// Append a user message to a thread
    pub async fn add_message(&self, thread_id: &str, content: &str) -> Result<ThreadMessage> {
        let request = CreateMessageRequest {
            role: "user",
            content,
        };
        self.post_json(&format!("threads/{}/messages", thread_id), &request)
            .await
    }

    /// Start a run of an assistant against a thread
    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunResource> {
        let request = CreateRunRequest { assistant_id };
        let run: RunResource = self
            .post_json(&format!("threads/{}/runs", thread_id), &request)
            .await?;
        tracing::debug!(run_id = %run.id, status = %run.status, "Started run");
        Ok(run)
    }

    /// Fetch the current state of a run
    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunResource> {
        self.get_json(&format!("threads/{}/runs/{}", thread_id, run_id))
            .await
    }

    /// List a thread's messages (newest first)
    pub async fn list_messages(&self, thread_id: &str) -> Result<MessageList> {
        self.get_json(&format!("threads/{}/messages", thread_id))
            .await
    }
}
