//! LLM client abstraction and provider selection.
//!
//! All chat providers implement [`LLMClient`], so the retriever and the
//! generation path work against any supported backend. Providers are
//! selected at runtime from a `provider/model` identifier (e.g.
//! `openai/gpt-4o`), the same convention the model catalog uses.

use crate::config::LlmConfig;
use crate::types::{AppError, Result};
use async_trait::async_trait;

/// Model identifiers accepted for the OpenAI provider.
pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

/// A lazily produced sequence of text fragments from one generation.
///
/// Each call to [`LLMClient::stream_with_history`] opens a fresh generation;
/// streams are not restartable. Dropping the stream releases the underlying
/// provider connection.
pub type TokenStream = Box<dyn futures::Stream<Item = Result<String>> + Send + Unpin>;

/// Generic LLM client trait for provider abstraction.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a single completion from a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a single completion from conversation history.
    ///
    /// Non-streaming; used for control calls such as query reformulation.
    async fn generate_with_history(
        &self,
        messages: &[(String, String)], // (role, content) pairs
    ) -> Result<String>;

    /// Stream a completion over conversation history.
    async fn stream_with_history(&self, messages: &[(String, String)]) -> Result<TokenStream>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Immutable per-client generation settings.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model_id: String,
    pub temperature: f32,
    pub streaming: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model_id: "openai/gpt-4o-mini".to_string(),
            temperature: 0.3,
            streaming: true,
        }
    }
}

/// Provider enum for runtime selection, one variant per backend.
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API (and compatible endpoints).
    #[cfg(feature = "openai")]
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Local Ollama server.
    #[cfg(feature = "ollama")]
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Resolve a `provider/model` identifier against the LLM configuration.
    pub fn from_model_id(model_id: &str, config: &LlmConfig) -> Result<Provider> {
        let (provider, model) = model_id.split_once('/').ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Model id '{}' must be of the form provider/model",
                model_id
            ))
        })?;

        match provider {
            #[cfg(feature = "openai")]
            "openai" => {
                if !OPENAI_MODELS.contains(&model) {
                    return Err(AppError::InvalidInput(format!(
                        "Unsupported OpenAI model '{}'. Supported: {}",
                        model,
                        OPENAI_MODELS.join(", ")
                    )));
                }
                let api_key = config.openai_api_key.clone().ok_or_else(|| {
                    AppError::InvalidInput("OPENAI_API_KEY not configured".to_string())
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: config.openai_api_base.clone(),
                    model: model.to_string(),
                })
            }

            #[cfg(feature = "ollama")]
            "ollama" => Ok(Provider::Ollama {
                base_url: config.ollama_url.clone(),
                model: model.to_string(),
            }),

            other => Err(AppError::InvalidInput(format!(
                "Unknown model provider '{}'",
                other
            ))),
        }
    }

    /// Create a client instance for this provider.
    pub fn create_client(&self, options: GenerationOptions) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                options.temperature,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => Ok(Box::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
            )?)),
        }
    }

    /// Get a human-readable name for this provider.
    pub fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI { .. } => "OpenAI",
            #[cfg(feature = "ollama")]
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
