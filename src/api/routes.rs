use crate::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(crate::api::handlers::chat::chat))
        .route("/ingest/files", post(crate::api::handlers::ingest::ingest_files))
        .route("/ingest/urls", post(crate::api::handlers::ingest::ingest_urls))
        .route(
            "/sessions/{session_id}/sources",
            get(crate::api::handlers::sessions::list_sources),
        )
        .route(
            "/sessions/{session_id}/clear",
            post(crate::api::handlers::sessions::clear_conversation),
        )
        .route("/health", get(health))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
