//! Ingestion handlers: file uploads and URL submissions.

use crate::{
    AppState,
    loader::{DocumentFormat, DocumentInput},
    types::{AppError, IngestResponse, IngestUrlsRequest, Result},
};
use axum::{Json, extract::Multipart, extract::State};
use std::time::Instant;

/// Upload documents (pdf, docx, txt, markdown, doc) into the session corpus.
///
/// Multipart form: an optional `session_id` text field plus one part per
/// file. Per-file failures are reported without aborting the batch.
#[utoipa::path(
    post,
    path = "/api/ingest/files",
    responses(
        (status = 200, description = "Per-file ingestion outcome", body = IngestResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "ingest"
)]
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let mut session_id = None;
    let mut inputs = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("session_id") {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Malformed session_id: {}", e)))?;
            session_id = Some(text);
            continue;
        }

        if let Some(filename) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
            let format = DocumentFormat::tag_from_filename(&filename);
            inputs.push(DocumentInput::File {
                name: filename,
                format,
                bytes: bytes.to_vec(),
            });
        }
    }

    if inputs.is_empty() {
        return Err(AppError::InvalidInput("No files in request".to_string()));
    }

    run_ingest(&state, session_id, inputs).await
}

/// Scrape URLs into the session corpus.
#[utoipa::path(
    post,
    path = "/api/ingest/urls",
    request_body = IngestUrlsRequest,
    responses(
        (status = 200, description = "Per-URL ingestion outcome", body = IngestResponse),
        (status = 400, description = "Invalid request")
    ),
    tag = "ingest"
)]
pub async fn ingest_urls(
    State(state): State<AppState>,
    Json(payload): Json<IngestUrlsRequest>,
) -> Result<Json<IngestResponse>> {
    if payload.urls.is_empty() {
        return Err(AppError::InvalidInput("No URLs in request".to_string()));
    }

    let inputs = payload.urls.into_iter().map(DocumentInput::Url).collect();
    run_ingest(&state, payload.session_id, inputs).await
}

async fn run_ingest(
    state: &AppState,
    session_id: Option<String>,
    inputs: Vec<DocumentInput>,
) -> Result<Json<IngestResponse>> {
    let start = Instant::now();
    let (session_id, session) = state.session(session_id);

    let report = {
        let mut guard = session.lock().await;
        state.engine.ingest(&mut guard, inputs).await
    };

    tracing::info!(
        session = %session_id,
        ingested = report.ingested.len(),
        skipped = report.skipped.len(),
        failures = report.failures.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Ingestion batch finished"
    );

    Ok(Json(IngestResponse {
        session_id,
        ingested: report.ingested,
        skipped: report.skipped,
        failures: report.failures,
    }))
}
