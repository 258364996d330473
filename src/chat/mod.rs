//! Chat session state and the engine driving plain and grounded turns.
//!
//! A [`ChatSession`] is the explicit session-scoped context: the append-only
//! conversation, the lazily created vector index, and the known-sources set
//! used for duplicate suppression. No ambient globals; every component
//! receives the session state it needs by reference.

use crate::config::RagConfig;
use crate::index::VectorIndex;
use crate::llm::{LLMClient, TokenStream};
use crate::loader::{DocumentInput, DocumentLoader, LoadOutcome};
use crate::rag::{EmbeddingProvider, PromptFusion, Retriever, TextChunker};
use crate::types::{IngestedSource, Message, Result, SourceFailure};
use std::collections::HashSet;
use std::sync::Arc;

// ============= Session State =============

pub struct ChatSession {
    pub id: String,
    /// Append-only conversation; past entries are never mutated.
    pub conversation: Vec<Message>,
    /// Created on first successful ingestion; grounded mode is unavailable
    /// until then.
    pub index: Option<Arc<VectorIndex>>,
    pub known_sources: HashSet<String>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation: Vec::new(),
            index: None,
            known_sources: HashSet::new(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.conversation.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.conversation.push(Message::assistant(content));
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    /// Grounded mode can be served once the session index holds records.
    pub fn grounded_available(&self) -> bool {
        self.index.as_ref().is_some_and(|index| !index.is_empty())
    }

    fn index_or_init(&mut self) -> Arc<VectorIndex> {
        self.index
            .get_or_insert_with(|| Arc::new(VectorIndex::new()))
            .clone()
    }
}

/// Aggregated outcome of one ingestion batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<IngestedSource>,
    pub skipped: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

// ============= Engine =============

/// Wires loader, chunker, index, retriever, fusion, and the LLM together.
pub struct ChatEngine {
    llm: Arc<dyn LLMClient>,
    embedder: Arc<dyn EmbeddingProvider>,
    loader: DocumentLoader,
    chunker: TextChunker,
    retriever: Retriever,
    fusion: PromptFusion,
}

impl ChatEngine {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        embedder: Arc<dyn EmbeddingProvider>,
        rag: &RagConfig,
    ) -> Result<Self> {
        Ok(Self {
            llm,
            embedder,
            loader: DocumentLoader::new()?,
            chunker: TextChunker::new(rag.chunk_size, rag.chunk_overlap),
            retriever: Retriever::new(rag.top_k, rag.history_window),
            fusion: PromptFusion::new(rag.max_context_chars),
        })
    }

    /// Ingest a batch of files/URLs into the session's vector index.
    ///
    /// Per-item failures are collected, never fatal to the batch.
    pub async fn ingest(
        &self,
        session: &mut ChatSession,
        inputs: Vec<DocumentInput>,
    ) -> IngestReport {
        let mut report = IngestReport::default();
        let outcomes = self.loader.load(inputs, &mut session.known_sources).await;

        for outcome in outcomes {
            match outcome {
                LoadOutcome::Skipped(source_id) => report.skipped.push(source_id),
                LoadOutcome::Failed { source_id, error } => {
                    report.failures.push(SourceFailure {
                        source_id,
                        error: error.to_string(),
                    });
                }
                LoadOutcome::Loaded(doc) => {
                    let chunks: Vec<_> = self.chunker.chunks(&doc.source_id, &doc.text).collect();
                    if chunks.is_empty() {
                        report.ingested.push(IngestedSource {
                            source_id: doc.source_id,
                            chunks: 0,
                        });
                        continue;
                    }

                    let index = session.index_or_init();
                    let outcome = index.insert(self.embedder.as_ref(), chunks).await;

                    if !outcome.failures.is_empty() {
                        let (_, first_error) = &outcome.failures[0];
                        report.failures.push(SourceFailure {
                            source_id: doc.source_id.clone(),
                            error: format!(
                                "embedding failed for {} chunk(s): {}",
                                outcome.failures.len(),
                                first_error
                            ),
                        });
                    }
                    if outcome.inserted > 0 || outcome.failures.is_empty() {
                        report.ingested.push(IngestedSource {
                            source_id: doc.source_id.clone(),
                            chunks: outcome.inserted,
                        });
                    }

                    tracing::info!(
                        source = %doc.source_id,
                        chunks = outcome.inserted,
                        failed = outcome.failures.len(),
                        "Source ingested"
                    );
                }
            }
        }

        report
    }

    /// Stream a response from the conversation alone.
    pub async fn stream_plain(&self, conversation: &[Message]) -> Result<TokenStream> {
        let messages: Vec<(String, String)> = conversation
            .iter()
            .map(|m| (m.role.as_str().to_string(), m.content.clone()))
            .collect();
        self.llm.stream_with_history(&messages).await
    }

    /// Stream a grounded response: retrieve, fuse, then generate.
    ///
    /// An empty index degrades to a no-context instruction; the turn still
    /// produces output.
    pub async fn stream_grounded(
        &self,
        index: &VectorIndex,
        conversation: &[Message],
    ) -> Result<TokenStream> {
        let (query, hits) = self
            .retriever
            .retrieve(
                self.llm.as_ref(),
                self.embedder.as_ref(),
                index,
                conversation,
            )
            .await?;

        tracing::info!(query = %query, hits = hits.len(), "Retrieved grounding context");

        let messages = self.fusion.fuse(&hits, conversation);
        self.llm.stream_with_history(&messages).await
    }
}
