use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Default model in `provider/model` form, e.g. `openai/gpt-4o-mini`.
    pub default_model: String,
    pub temperature: f32,
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub ollama_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    pub embedding_model: String,
    pub embedding_dims: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Character budget for the fused context block.
    pub max_context_chars: usize,
    /// How many trailing messages the retriever may use to resolve references.
    pub history_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
            },
            llm: LlmConfig {
                default_model: env::var("MODEL")
                    .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
                temperature: env::var("TEMPERATURE")
                    .unwrap_or_else(|_| "0.3".to_string())
                    .parse()?,
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                openai_api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                ollama_url: env::var("OLLAMA_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            },
            rag: RagConfig {
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                embedding_dims: env::var("EMBEDDING_DIMS")
                    .unwrap_or_else(|_| "1536".to_string())
                    .parse()?,
                chunk_size: env::var("CHUNK_SIZE")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
                chunk_overlap: env::var("CHUNK_OVERLAP")
                    .unwrap_or_else(|_| "200".to_string())
                    .parse()?,
                top_k: env::var("TOP_K").unwrap_or_else(|_| "4".to_string()).parse()?,
                max_context_chars: env::var("MAX_CONTEXT_CHARS")
                    .unwrap_or_else(|_| "6000".to_string())
                    .parse()?,
                history_window: env::var("HISTORY_WINDOW")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()?,
            },
        })
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dims: 1536,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            max_context_chars: 6000,
            history_window: 6,
        }
    }
}
