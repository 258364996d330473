//! Session introspection handlers.

use crate::{
    AppState,
    types::{AppError, Result, SourcesResponse},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// List the source identifiers ingested into a session.
#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/sources",
    responses(
        (status = 200, description = "Ingested sources", body = SourcesResponse),
        (status = 404, description = "Unknown session")
    ),
    tag = "sessions"
)]
pub async fn list_sources(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SourcesResponse>> {
    let session = state
        .existing_session(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", session_id)))?;

    let guard = session.lock().await;
    let (sources, records) = match &guard.index {
        Some(index) => (index.sources(), index.len()),
        None => (Vec::new(), 0),
    };

    Ok(Json(SourcesResponse {
        session_id,
        sources,
        records,
        grounded_available: guard.grounded_available(),
    }))
}

/// Clear a session's conversation, keeping its ingested corpus.
#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/clear",
    responses(
        (status = 200, description = "Conversation cleared"),
        (status = 404, description = "Unknown session")
    ),
    tag = "sessions"
)]
pub async fn clear_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let session = state
        .existing_session(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", session_id)))?;

    session.lock().await.clear_conversation();
    tracing::info!(session = %session_id, "Conversation cleared");

    Ok(Json(serde_json::json!({ "cleared": true })))
}
