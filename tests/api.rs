//! API endpoint integration tests

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use murmur_gateway::GroqClient;
use tower::ServiceExt;

mod common;
use common::{build_test_router, MockBackend};

async fn post_json(router: axum::Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_body(router: axum::Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// SSE data lines in arrival order
fn sse_data_lines(body: &str) -> Vec<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect()
}

#[tokio::test]
async fn chat_returns_upstream_reply() {
    let router = build_test_router(Arc::new(MockBackend::text("Hi there!")));

    let (status, json) = post_json(router, "/chat", serde_json::json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "Hi there!");
}

#[tokio::test]
async fn chat_accepts_full_transcript() {
    let router = build_test_router(Arc::new(MockBackend::text("And hello again.")));

    let (status, json) = post_json(
        router,
        "/chat",
        serde_json::json!({
            "transcript": [
                {"role": "user", "content": "hello"},
                {"role": "assistant", "content": "hi"},
                {"role": "user", "content": "hello again"}
            ]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "And hello again.");
}

#[tokio::test]
async fn chat_falls_back_when_upstream_unavailable() {
    let router = build_test_router(Arc::new(MockBackend::unavailable()));

    let (status, json) = post_json(router, "/chat", serde_json::json!({"message": "hello"})).await;

    // Degraded, never a 5xx
    assert_eq!(status, StatusCode::OK);
    let reply = json["reply"].as_str().unwrap();
    assert!(!reply.trim().is_empty());
}

#[tokio::test]
async fn chat_without_key_uses_canned_reply() {
    let backend = Arc::new(GroqClient::new(None, "test-model"));
    let router = build_test_router(backend);

    let (status, json) = post_json(router, "/chat", serde_json::json!({"message": "hello"})).await;

    assert_eq!(status, StatusCode::OK);
    let reply = json["reply"].as_str().unwrap();
    assert!(!reply.trim().is_empty());
}

#[tokio::test]
async fn chat_with_empty_message_still_replies() {
    let router = build_test_router(Arc::new(MockBackend::text("unused")));

    let (status, json) = post_json(router, "/chat", serde_json::json!({"message": "   "})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!json["reply"].as_str().unwrap().trim().is_empty());
}

#[tokio::test]
async fn chat_declines_overlong_message_politely() {
    let router = build_test_router(Arc::new(MockBackend::text("unused")));
    let long_message = "x".repeat(2000);

    let (status, json) = post_json(
        router,
        "/chat",
        serde_json::json!({"message": long_message}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["reply"].as_str().unwrap().contains("too long"));
}

#[tokio::test]
async fn chat_stream_relays_fragments_and_ends_with_done() {
    let router = build_test_router(Arc::new(MockBackend::fragments(&[
        "The sky is blue. ",
        "Water is wet.",
    ])));

    let (status, body) = get_body(router, "/chat_stream?q=tell%20me%20things").await;

    assert_eq!(status, StatusCode::OK);
    let lines = sse_data_lines(&body);
    assert_eq!(lines.last(), Some(&"[DONE]"));

    let text: String = lines[..lines.len() - 1]
        .iter()
        .map(|line| {
            let json: serde_json::Value = serde_json::from_str(line).unwrap();
            json["fragment"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(text, "The sky is blue. Water is wet.");
}

#[tokio::test]
async fn chat_stream_failure_emits_fallback_then_done() {
    let router = build_test_router(Arc::new(MockBackend::fail_after(&["Partial. "])));

    let (status, body) = get_body(router, "/chat_stream?q=hello").await;

    assert_eq!(status, StatusCode::OK);
    let lines = sse_data_lines(&body);

    // Terminal marker is always last, and the event before it carries the
    // non-empty fallback text
    assert_eq!(lines.last(), Some(&"[DONE]"));
    let before_done: serde_json::Value = serde_json::from_str(lines[lines.len() - 2]).unwrap();
    assert!(!before_done["fragment"].as_str().unwrap().trim().is_empty());
}

#[tokio::test]
async fn chat_stream_unavailable_still_terminates() {
    let router = build_test_router(Arc::new(MockBackend::unavailable()));

    let (status, body) = get_body(router, "/chat_stream?q=hello").await;

    assert_eq!(status, StatusCode::OK);
    let lines = sse_data_lines(&body);
    assert_eq!(lines.last(), Some(&"[DONE]"));
    assert!(lines.len() >= 2, "expected a fallback fragment before the marker");
}

#[tokio::test]
async fn chat_stream_empty_query_prompts_for_input() {
    let router = build_test_router(Arc::new(MockBackend::text("unused")));

    let (status, body) = get_body(router, "/chat_stream?q=").await;

    assert_eq!(status, StatusCode::OK);
    let lines = sse_data_lines(&body);
    assert_eq!(lines.last(), Some(&"[DONE]"));
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert!(!first["fragment"].as_str().unwrap().trim().is_empty());
}

#[tokio::test]
async fn chat_stream_accepts_post_transcript() {
    let router = build_test_router(Arc::new(MockBackend::fragments(&["Hello back."])));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat_stream")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "transcript": [{"role": "user", "content": "hello"}]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.contains("Hello back."));
    assert_eq!(sse_data_lines(&body).last(), Some(&"[DONE]"));
}

#[tokio::test]
async fn health_reports_ok() {
    let router = build_test_router(Arc::new(MockBackend::text("ignored")));

    let (status, body) = get_body(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn health_groq_reports_available_backend() {
    let router = build_test_router(Arc::new(MockBackend::text("OK")));

    let (status, body) = get_body(router, "/health_groq").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["available"], true);
    assert!(json.get("reason").is_none());
}

#[tokio::test]
async fn health_groq_without_key_reports_unavailable() {
    let backend = Arc::new(GroqClient::new(None, "test-model"));
    let router = build_test_router(backend);

    let (status, body) = get_body(router, "/health_groq").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["available"], false);
    assert!(!json["reason"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn health_groq_with_malformed_key_reports_reason() {
    // A key that does not carry the Groq prefix fails the credential check
    // before any network I/O
    let backend = Arc::new(GroqClient::new(
        Some("sk-wrong-provider".to_string()),
        "test-model",
    ));
    let router = build_test_router(backend);

    let (status, body) = get_body(router, "/health_groq").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["available"], false);
    assert!(!json["reason"].as_str().unwrap().is_empty());
}
