use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Conversation Types =============

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

// ============= Corpus Types =============

/// A contiguous span of text cut from an ingested source.
///
/// Chunks are immutable once created; `id` is a content hash stable across
/// re-ingestion of the same source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub source_id: String,
    pub position: usize,
    pub text: String,
}

/// The persisted unit of the vector index: a chunk plus its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned from similarity search, with its cosine score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Request grounded (RAG) mode. Honored only when the session has
    /// ingested sources; otherwise the turn falls back to plain mode.
    #[serde(default)]
    pub grounded: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestUrlsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestedSource {
    pub source_id: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: String,
}

/// Per-item outcome of an ingestion batch. Failures never abort siblings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    pub session_id: String,
    pub ingested: Vec<IngestedSource>,
    /// Sources suppressed because the same identifier was already ingested.
    pub skipped: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SourcesResponse {
    pub session_id: String,
    pub sources: Vec<String>,
    pub records: usize,
    /// True when grounded mode can be served for this session.
    pub grounded_available: bool,
}

// ============= Error Types =============

/// Failure loading a single ingestion input. Scoped to that input only.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("parse failed: {0}")]
    ParseFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Load(LoadError::UnsupportedFormat(_)) => {
                axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            AppError::Load(_) => axum::http::StatusCode::BAD_GATEWAY,
            AppError::Embedding(_) | AppError::Generation(_) | AppError::Internal(_) => {
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
