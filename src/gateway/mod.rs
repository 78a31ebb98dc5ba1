//! Gateway HTTP surface
//!
//! Exposes the assistant bridge as a small HTTP API: `POST
//! /v1/assistant` performs one exchange, `GET /health` reports liveness.
//! Every response carries permissive CORS headers and OPTIONS preflights
//! answer 200 with no body, so browser clients can call the gateway
//! directly.
//!
//! The wire types here are shared with the client side
//! ([`crate::chat::HttpGateway`]) so both ends agree on field naming.

use crate::assistant::AssistantService;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

/// Chat request body accepted by `POST /v1/assistant`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    /// Outbound message text
    pub message: String,

    /// Attached file identifiers (accepted for compatibility, unused)
    #[serde(rename = "file_ids", default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,

    /// Existing assistant to reuse when continuing a session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    /// Existing thread to reuse when continuing a session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Reuse the supplied identifiers instead of creating fresh ones
    #[serde(default)]
    pub continue_session: bool,
}

/// Success body returned by `POST /v1/assistant`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    /// Assistant response text
    pub response: String,
    /// Assistant identifier used for this exchange
    pub assistant_id: String,
    /// Thread identifier used for this exchange
    pub thread_id: String,
    /// Run identifier that produced the response
    pub run_id: String,
    /// Completion time, RFC-3339
    pub timestamp: String,
    /// Whether the request continued an existing session
    pub session_continued: bool,
}

/// Error body returned with HTTP 500
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable, user-safe summary
    pub error: String,
    /// Underlying error detail for logs and diagnostics
    pub details: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

/// Shared gateway state
#[derive(Clone)]
pub struct GatewayState {
    service: Arc<AssistantService>,
}

/// Build the gateway router
///
/// # Arguments
///
/// * `service` - The assistant service handling exchanges
pub fn router(service: Arc<AssistantService>) -> Router {
    let state = GatewayState { service };

    Router::new()
        .route("/v1/assistant", post(handle_assistant))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "deskmind".to_string(),
    })
}

async fn handle_assistant(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(request): Json<AssistantRequest>,
) -> Response {
    let user_id = headers
        .get("user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous");

    tracing::info!(
        user_id,
        continue_session = request.continue_session,
        "Processing assistant request"
    );
    if !request.file_ids.is_empty() {
        tracing::debug!(count = request.file_ids.len(), "Ignoring attached file ids");
    }

    metrics::increment_counter!("gateway_requests_total");
    let started = Instant::now();

    // One token per request; honored at every polling iteration.
    let cancel = CancellationToken::new();

    let result = state
        .service
        .exchange(
            &request.message,
            request.assistant_id.as_deref(),
            request.thread_id.as_deref(),
            request.continue_session,
            &cancel,
        )
        .await;

    metrics::histogram!(
        "gateway_request_duration_seconds",
        started.elapsed().as_secs_f64()
    );

    match result {
        Ok(outcome) => Json(AssistantResponse {
            response: outcome.response,
            assistant_id: outcome.assistant_id,
            thread_id: outcome.thread_id,
            run_id: outcome.run_id,
            timestamp: outcome.timestamp.to_rfc3339(),
            session_continued: outcome.session_continued,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(user_id, "Assistant request failed: {}", err);
            metrics::increment_counter!("gateway_errors_total");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to process assistant request".to_string(),
                    details: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}
