//! Embedding provider abstraction and implementations.
//!
//! The vector index embeds chunk and query text through [`EmbeddingProvider`].
//! The default backend calls the OpenAI embeddings API with batching and
//! exponential backoff; a local `fastembed` backend is available behind the
//! `local-embeddings` feature.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// External collaborator turning batches of texts into equal-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Returns the model identifier (e.g. `text-embedding-3-small`).
    fn model_name(&self) -> &str;

    /// Returns the embedding vector dimensionality.
    fn dims(&self) -> usize;
}

// ============ OpenAI Provider ============

/// Embedding provider calling `POST /embeddings` on an OpenAI-compatible API.
///
/// Retry strategy:
/// - HTTP 429 or 5xx: retry with exponential backoff (1s, 2s, 4s, ...)
/// - HTTP 4xx (not 429): fail immediately
/// - network error: retry
pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dims: usize,
    max_retries: u32,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: String, api_base: String, model: String, dims: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base,
            model,
            dims,
            max_retries: 3,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await.map_err(|e| {
                            AppError::Embedding(format!("Invalid embedding response: {}", e))
                        })?;
                        return parse_embedding_response(&json, texts.len());
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(AppError::Embedding(format!(
                            "Embedding API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    return Err(AppError::Embedding(format!(
                        "Embedding API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(AppError::Embedding(format!("Embedding request failed: {}", e)));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| AppError::Embedding("Embedding failed after retries".to_string())))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

/// Extract `data[].embedding` arrays, checking one vector per input.
fn parse_embedding_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| AppError::Embedding("Invalid response: missing data array".to_string()))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| AppError::Embedding("Invalid response: missing embedding".to_string()))?;

        let vec: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vec);
    }

    if embeddings.len() != expected {
        return Err(AppError::Embedding(format!(
            "Embedding response has {} vectors for {} inputs",
            embeddings.len(),
            expected
        )));
    }

    Ok(embeddings)
}

// ============ Local Provider ============

/// Local embedding backend running a fastembed ONNX model in-process.
#[cfg(feature = "local-embeddings")]
pub struct LocalEmbeddings {
    model: tokio::sync::Mutex<fastembed::TextEmbedding>,
    model_name: String,
    dims: usize,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbeddings {
    pub fn new() -> Result<Self> {
        let model = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(fastembed::EmbeddingModel::BGESmallENV15),
        )
        .map_err(|e| AppError::Embedding(e.to_string()))?;

        Ok(Self {
            model: tokio::sync::Mutex::new(model),
            model_name: "BAAI/bge-small-en-v1.5".to_string(),
            dims: 384,
        })
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl EmbeddingProvider for LocalEmbeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let owned: Vec<String> = texts.to_vec();
        let mut model = self.model.lock().await;
        model
            .embed(owned, None)
            .map_err(|e| AppError::Embedding(e.to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dims(&self) -> usize {
        self.dims
    }
}
