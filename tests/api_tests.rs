//! HTTP API tests over the in-process router with mock providers.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::mocks::{MockEmbedder, MockLLMClient};
use ragbot::chat::ChatEngine;
use ragbot::config::{Config, LlmConfig, RagConfig, ServerConfig};
use ragbot::{AppState, api};
use std::sync::Arc;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        llm: LlmConfig {
            default_model: "openai/gpt-4o-mini".to_string(),
            temperature: 0.3,
            openai_api_key: Some("sk-test".to_string()),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
        },
        rag: RagConfig::default(),
    }
}

fn test_app(llm: MockLLMClient) -> axum::Router {
    let engine = Arc::new(
        ChatEngine::new(Arc::new(llm), Arc::new(MockEmbedder), &RagConfig::default()).unwrap(),
    );
    let state = AppState::new(engine, Arc::new(test_config()));
    axum::Router::new()
        .nest("/api", api::create_router())
        .with_state(state)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(MockLLMClient::new("ok"));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("ok"));
}

#[tokio::test]
async fn test_chat_streams_tokens_as_sse() {
    let app = test_app(MockLLMClient::new("Hello there"));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message": "Hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let body = body_string(response).await;
    assert!(body.contains("Hello"));
    assert!(body.contains("event: done"));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let app = test_app(MockLLMClient::new("ok"));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message": "   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sources_for_unknown_session_is_not_found() {
    let app = test_app(MockLLMClient::new("ok"));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions/no-such-session/sources")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ingest_urls_requires_urls() {
    let app = test_app(MockLLMClient::new("ok"));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/ingest/urls")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"urls": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_session_round_trip_keeps_history() {
    let llm = MockLLMClient::new("First reply");
    let app = test_app(llm.clone());

    // First turn mints a session; the done event carries its id.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message": "Hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_string(response).await;
    let session_id = body
        .lines()
        .skip_while(|l| *l != "event: done")
        .nth(1)
        .and_then(|l| l.strip_prefix("data: "))
        .expect("done event carries the session id")
        .to_string();

    // Second turn in the same session: the prompt must include turn one.
    let request_body = format!(r#"{{"message": "And again?", "session_id": "{}"}}"#, session_id);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body))
                .unwrap(),
        )
        .await
        .unwrap();
    body_string(response).await;

    let last = llm.last_call().unwrap();
    let contents: Vec<&str> = last.iter().map(|(_, c)| c.as_str()).collect();
    assert!(contents.contains(&"Hi"));
    assert!(contents.contains(&"First reply"));
    assert!(contents.contains(&"And again?"));
}
