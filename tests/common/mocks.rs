//! Mock implementations for testing.
//!
//! Provides mock LLM clients and embedding providers usable across test
//! files without duplication and without any network dependency.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use ragbot::llm::{LLMClient, TokenStream};
use ragbot::rag::EmbeddingProvider;
use ragbot::types::{AppError, Result};
use std::sync::Arc;

/// Mock LLM client with a configurable single response.
///
/// The same text is returned by the single-shot call and, split into small
/// fragments, by the streaming call. Every request's message list is
/// recorded so tests can assert on the prompts the core actually built.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    pub calls: Arc<Mutex<Vec<Vec<(String, String)>>>>,
}

impl MockLLMClient {
    /// Create a mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Messages passed to the most recent call.
    pub fn last_call(&self) -> Option<Vec<(String, String)>> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_history(&[("user".to_string(), prompt.to_string())])
            .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        self.calls.lock().push(messages.to_vec());
        if self.should_fail {
            return Err(AppError::Generation("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn stream_with_history(&self, messages: &[(String, String)]) -> Result<TokenStream> {
        self.calls.lock().push(messages.to_vec());
        if self.should_fail {
            return Err(AppError::Generation("Mock LLM failure".to_string()));
        }

        let chunks: Vec<Result<String>> = self
            .response
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| Ok(c.iter().collect()))
            .collect();

        Ok(Box::new(stream::iter(chunks)))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Deterministic embedding provider: bag-of-words hashed into a fixed-size
/// vector. Identical text always embeds identically, so exact-text queries
/// score 1.0 against their own chunk.
pub struct MockEmbedder;

pub const MOCK_DIMS: usize = 32;

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; MOCK_DIMS];
                for word in text.to_lowercase().split_whitespace() {
                    let bucket =
                        word.bytes().fold(0usize, |acc, b| acc * 31 + b as usize) % MOCK_DIMS;
                    v[bucket] += 1.0;
                }
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "mock-embedder"
    }

    fn dims(&self) -> usize {
        MOCK_DIMS
    }
}

/// Embedding provider that always fails, for unreachable-provider paths.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(AppError::Embedding("Mock embedding failure".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-embedder"
    }

    fn dims(&self) -> usize {
        MOCK_DIMS
    }
}
