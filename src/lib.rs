//! # RAGbot - Retrieval-Augmented Chat Assistant
//!
//! A chat assistant server that optionally grounds model responses in a
//! private document/URL corpus ingested at runtime.
//!
//! ## Overview
//!
//! RAGbot can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `ragbot-server` binary
//! 2. **As a library** - Import the pipeline components into your own project
//!
//! ## Pipeline
//!
//! Uploads and URLs flow through the [`loader`] and [`rag::chunker`] into a
//! session's [`index::VectorIndex`] (write path). Each user turn flows
//! through [`rag::retriever`] and [`rag::fusion`] into a streamed generation
//! (read path). The vector index is the only integration point between the
//! two paths.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use ragbot::{ChatEngine, ChatSession, Provider, GenerationOptions};
//! use ragbot::config::Config;
//! use std::sync::Arc;
//!
//! let config = Config::from_env()?;
//! let provider = Provider::from_model_id(&config.llm.default_model, &config.llm)?;
//! let llm = provider.create_client(GenerationOptions::default())?.into();
//! let embedder = Arc::new(ragbot::rag::OpenAIEmbeddings::new(/* ... */)?);
//!
//! let engine = ChatEngine::new(llm, embedder, &config.rag)?;
//! let mut session = ChatSession::new("local");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI API chat provider (default) |
//! | `ollama` | Local Ollama chat provider |
//! | `local-embeddings` | In-process fastembed embedding backend |

/// HTTP API handlers and routes.
pub mod api;
/// Chat session state and the turn engine.
pub mod chat;
/// Environment-driven configuration.
pub mod config;
/// Session-scoped vector index.
pub mod index;
/// LLM provider clients and abstractions.
pub mod llm;
/// Document loading (files and URLs) to plain text.
pub mod loader;
/// RAG pipeline components (chunker, embeddings, retriever, fusion).
pub mod rag;
/// Core types (messages, chunks, errors).
pub mod types;

// Re-export commonly used types
pub use chat::{ChatEngine, ChatSession};
pub use config::Config;
pub use index::VectorIndex;
pub use llm::{GenerationOptions, LLMClient, Provider};
pub use types::{AppError, Result};

use std::collections::HashMap;
use std::sync::Arc;

type SessionHandle = Arc<tokio::sync::Mutex<ChatSession>>;

/// Application state shared across handlers.
///
/// Each session id owns an independent context (conversation, vector index,
/// dedup set); nothing is shared between sessions.
#[derive(Clone)]
pub struct AppState {
    /// The wired pipeline (loader, chunker, index ops, retriever, fusion, LLM).
    pub engine: Arc<ChatEngine>,
    /// Runtime configuration.
    pub config: Arc<Config>,
    sessions: Arc<parking_lot::RwLock<HashMap<String, SessionHandle>>>,
}

impl AppState {
    pub fn new(engine: Arc<ChatEngine>, config: Arc<Config>) -> Self {
        Self {
            engine,
            config,
            sessions: Arc::new(parking_lot::RwLock::new(HashMap::new())),
        }
    }

    /// Fetch or create the session for `id`, minting a fresh uuid when the
    /// caller has none yet.
    pub fn session(&self, id: Option<String>) -> (String, SessionHandle) {
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut sessions = self.sessions.write();
        let handle = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(ChatSession::new(id.clone()))))
            .clone();
        (id, handle)
    }

    /// Fetch an existing session without creating one.
    pub fn existing_session(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().get(id).cloned()
    }
}
