//! Query reformulation and top-k retrieval.
//!
//! Before searching, the latest user turn is rewritten into a standalone
//! question by a non-streaming LLM call, using the last few turns to resolve
//! pronouns and ellipsis. If that call fails the retriever degrades to the
//! raw message rather than aborting the turn.

use crate::index::VectorIndex;
use crate::llm::LLMClient;
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{Message, MessageRole, Result, ScoredChunk};

const REWRITE_INSTRUCTION: &str = "Rewrite the user's latest message as a single self-contained \
question for a document search. Resolve pronouns and references using the prior conversation \
only as disambiguation context. Reply with the rewritten question and nothing else.";

pub struct Retriever {
    top_k: usize,
    history_window: usize,
}

impl Retriever {
    pub fn new(top_k: usize, history_window: usize) -> Self {
        Self {
            top_k: top_k.max(1),
            history_window,
        }
    }

    /// Produce a standalone query for the conversation and fetch the most
    /// relevant chunks. Returns the query actually used alongside the hits.
    pub async fn retrieve(
        &self,
        llm: &dyn LLMClient,
        embedder: &dyn EmbeddingProvider,
        index: &VectorIndex,
        conversation: &[Message],
    ) -> Result<(String, Vec<ScoredChunk>)> {
        let query = self.standalone_query(llm, conversation).await;
        let hits = index.search(embedder, &query, self.top_k).await?;
        Ok((query, hits))
    }

    /// Rewrite the latest user turn into a self-contained question.
    ///
    /// Single-turn conversations have nothing to disambiguate and skip the
    /// model call. Reformulation failure falls back to the raw message.
    async fn standalone_query(&self, llm: &dyn LLMClient, conversation: &[Message]) -> String {
        let raw = latest_user_message(conversation);

        let prior: Vec<&Message> = conversation
            .iter()
            .rev()
            .skip(1)
            .take(self.history_window)
            .collect();
        if prior.is_empty() {
            return raw;
        }

        let mut transcript = String::new();
        for message in prior.iter().rev() {
            transcript.push_str(message.role.as_str());
            transcript.push_str(": ");
            transcript.push_str(&message.content);
            transcript.push('\n');
        }

        let messages = vec![
            ("system".to_string(), REWRITE_INSTRUCTION.to_string()),
            (
                "user".to_string(),
                format!(
                    "Conversation so far:\n{}\nLatest message: {}",
                    transcript, raw
                ),
            ),
        ];

        match llm.generate_with_history(&messages).await {
            Ok(rewritten) => {
                let rewritten = rewritten.trim().trim_matches('"').to_string();
                if rewritten.is_empty() {
                    tracing::warn!("Query reformulation returned empty text, using raw message");
                    raw
                } else {
                    tracing::debug!(query = %rewritten, "Reformulated search query");
                    rewritten
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Query reformulation failed, using raw message");
                raw
            }
        }
    }
}

/// The content of the most recent user turn, or the last message as a
/// fallback for malformed histories.
fn latest_user_message(conversation: &[Message]) -> String {
    conversation
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .or_else(|| conversation.last())
        .map(|m| m.content.clone())
        .unwrap_or_default()
}
