//! LLM provider clients and abstractions.
//!
//! A unified interface over the supported chat backends. The rest of the
//! application only sees [`LLMClient`]; the concrete backend is picked at
//! startup from the configured `provider/model` identifier.
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API (default)
//! - `ollama` - Local Ollama server

/// Core LLM client trait, provider enum, and generation options.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{GenerationOptions, LLMClient, Provider, TokenStream};
