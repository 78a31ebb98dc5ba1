//! Integration tests for the gateway HTTP surface
//!
//! Drives the full handler stack against a mocked upstream assistants
//! API: assistant/thread creation, message append, run polling, and
//! response extraction, plus the error taxonomy surfaced as HTTP 500.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deskmind::assistant::AssistantService;
use deskmind::config::AssistantConfig;
use deskmind::gateway;

const API_VERSION: &str = "2024-05-01-preview";

/// Build a gateway router backed by the mock upstream.
fn test_app(server: &MockServer, poll_max_attempts: u32) -> Router {
    let config = AssistantConfig {
        base_url: server.uri(),
        vector_store_id: "vs_test".to_string(),
        poll_interval_ms: 5,
        poll_max_attempts,
        ..Default::default()
    };
    let service = AssistantService::new(config, "test-key".to_string()).unwrap();
    gateway::router(Arc::new(service))
}

/// POST a chat request and decode the JSON response.
async fn post_assistant(app: &Router, body: Value, user_id: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/v1/assistant")
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(user_id) = user_id {
        request = request.header("user-id", user_id);
    }

    let request = request
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

/// Mount the mocks for one successful exchange on a fresh thread.
///
/// Mocks match in mount order, so tests that override a step must
/// mount their stricter mock before calling this helper.
async fn mount_happy_path(server: &MockServer, thread_id: &str) {
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .and(query_param("api-version", API_VERSION))
        .and(header_matcher("api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_1" })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": thread_id })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/threads/{}/messages", thread_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "msg_user", "role": "user" })),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/threads/{}/runs", thread_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_1", "status": "queued" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/threads/{}/runs/run_1", thread_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_1", "status": "completed" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/threads/{}/messages", thread_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "msg_reply",
                    "role": "assistant",
                    "created_at": 200,
                    "content": [{ "type": "text", "text": { "value": "R1" } }]
                },
                {
                    "id": "msg_user",
                    "role": "user",
                    "created_at": 100,
                    "content": [{ "type": "text", "text": { "value": "Hello" } }]
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_session_creates_assistant_and_thread() {
    let server = MockServer::start().await;

    // The user message must be forwarded verbatim with role "user"
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .and(body_partial_json(json!({ "role": "user", "content": "Hello" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "msg_user", "role": "user" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_happy_path(&server, "thread_1").await;

    let app = test_app(&server, 30);
    let (status, body) = post_assistant(&app, json!({ "message": "Hello" }), Some("alex")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "R1");
    assert_eq!(body["assistantId"], "asst_1");
    assert_eq!(body["threadId"], "thread_1");
    assert_eq!(body["runId"], "run_1");
    assert_eq!(body["sessionContinued"], false);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_continue_session_reuses_identifiers() {
    let server = MockServer::start().await;

    // Creation endpoints must not be called when continuing
    Mock::given(method("POST"))
        .and(path("/assistants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "asst_fresh" })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_fresh" })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_42/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "msg_user", "role": "user" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/threads/thread_42/runs"))
        .and(body_partial_json(json!({ "assistant_id": "asst_7" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_2", "status": "in_progress" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/thread_42/runs/run_2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_2", "status": "completed" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/threads/thread_42/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "msg_reply",
                "role": "assistant",
                "created_at": 300,
                "content": [{ "type": "text", "text": { "value": "R2" } }]
            }]
        })))
        .mount(&server)
        .await;

    let app = test_app(&server, 30);
    let (status, body) = post_assistant(
        &app,
        json!({
            "message": "Follow-up",
            "assistantId": "asst_7",
            "threadId": "thread_42",
            "continueSession": true
        }),
        Some("alex"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assistantId"], "asst_7");
    assert_eq!(body["threadId"], "thread_42");
    assert_eq!(body["sessionContinued"], true);
    assert_eq!(body["response"], "R2");
}

#[tokio::test]
async fn test_run_failure_returns_500_with_terminal_status() {
    let server = MockServer::start().await;

    // The run fails immediately; mounted first so it wins over the
    // happy-path status mock
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_1", "status": "failed" })),
        )
        .mount(&server)
        .await;

    mount_happy_path(&server, "thread_1").await;

    let app = test_app(&server, 30);
    let (status, body) = post_assistant(&app, json!({ "message": "Hello" }), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process assistant request");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("ended with status: failed"));
}

#[tokio::test]
async fn test_run_timeout_is_distinct_from_failure() {
    let server = MockServer::start().await;

    // Never progresses past in_progress
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "run_1", "status": "in_progress" })),
        )
        .mount(&server)
        .await;

    mount_happy_path(&server, "thread_1").await;

    let app = test_app(&server, 2);
    let (status, body) = post_assistant(&app, json!({ "message": "Hello" }), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("timed out after 2 polling attempts"));
    assert!(!details.contains("ended with status"));
}

#[tokio::test]
async fn test_empty_response_is_fatal() {
    let server = MockServer::start().await;

    // Thread only contains the user's own message
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "msg_user",
                "role": "user",
                "created_at": 100,
                "content": [{ "type": "text", "text": { "value": "Hello" } }]
            }]
        })))
        .mount(&server)
        .await;

    mount_happy_path(&server, "thread_1").await;

    let app = test_app(&server, 30);
    let (status, body) = post_assistant(&app, json!({ "message": "Hello" }), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("No assistant response"));
}

#[tokio::test]
async fn test_upstream_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/assistants"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway upstream"))
        .mount(&server)
        .await;

    let app = test_app(&server, 30);
    let (status, body) = post_assistant(&app, json!({ "message": "Hello" }), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let details = body["details"].as_str().unwrap();
    assert!(details.contains("502"));
    assert!(details.contains("bad gateway upstream"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = test_app(&server, 30);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "deskmind");
}

#[tokio::test]
async fn test_cors_preflight_returns_200() {
    let server = MockServer::start().await;
    let app = test_app(&server, 30);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/v1/assistant")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "content-type,user-id",
        )
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_responses_carry_cors_headers() {
    let server = MockServer::start().await;
    mount_happy_path(&server, "thread_1").await;

    let app = test_app(&server, 30);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/assistant")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, "https://app.example.com")
        .body(Body::from(
            serde_json::to_string(&json!({ "message": "Hello" })).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
