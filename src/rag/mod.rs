//! Retrieval Augmented Generation (RAG) pipeline components.
//!
//! The write path runs loader output through [`chunker`] into the vector
//! index; the read path runs the conversation through [`retriever`] and
//! [`fusion`] before generation:
//!
//! 1. **Ingestion** - sources are chunked and embedded
//! 2. **Storage** - embedding records held by the session's vector index
//! 3. **Retrieval** - the reformulated query pulls the top-k chunks
//! 4. **Fusion** - context and history merge into a grounded prompt
//! 5. **Generation** - the model streams a response with the context

pub mod chunker;
pub mod embeddings;
pub mod fusion;
pub mod retriever;

pub use chunker::TextChunker;
pub use embeddings::{EmbeddingProvider, OpenAIEmbeddings};
pub use fusion::PromptFusion;
pub use retriever::Retriever;
