//! Prompt fusion: retrieved context + conversation history into one
//! grounded instruction for the generator.

use crate::types::{Message, ScoredChunk};

const GROUNDED_INSTRUCTION: &str = "You are an assistant that answers using the provided context. \
Answer the user's question from the context excerpts below whenever possible, and cite the \
source identifiers you used. If the context is insufficient to answer, say so explicitly \
before answering from general knowledge.";

const NO_CONTEXT_INSTRUCTION: &str = "You are an assistant that answers using retrieved \
documents, but no relevant context was found in the ingested sources for this question. \
Say so explicitly, then answer from general knowledge if you can.";

pub struct PromptFusion {
    max_context_chars: usize,
}

impl PromptFusion {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }

    /// Build the grounded message sequence: a system instruction embedding
    /// the context block, followed by the conversation turns unchanged.
    ///
    /// `chunks` must be ordered by descending similarity; when the context
    /// budget overflows, the lowest-similarity chunks are dropped first.
    /// The conversation itself is never truncated here.
    pub fn fuse(&self, chunks: &[ScoredChunk], conversation: &[Message]) -> Vec<(String, String)> {
        let system = if chunks.is_empty() {
            NO_CONTEXT_INSTRUCTION.to_string()
        } else {
            format!(
                "{}\n\nContext:\n{}",
                GROUNDED_INSTRUCTION,
                self.context_block(chunks)
            )
        };

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(("system".to_string(), system));
        for message in conversation {
            messages.push((message.role.as_str().to_string(), message.content.clone()));
        }
        messages
    }

    /// Format chunks as labeled excerpts under the character budget.
    fn context_block(&self, chunks: &[ScoredChunk]) -> String {
        let mut block = String::new();

        for (i, scored) in chunks.iter().enumerate() {
            let entry = format!(
                "[{}] ({})\n{}\n\n",
                i + 1,
                scored.chunk.source_id,
                scored.chunk.text
            );
            if block.len() + entry.len() > self.max_context_chars {
                tracing::debug!(
                    dropped = chunks.len() - i,
                    "Context budget reached, dropping lowest-similarity chunks"
                );
                break;
            }
            block.push_str(&entry);
        }

        block.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn scored(source: &str, text: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: format!("{}-{}", source, score),
                source_id: source.to_string(),
                position: 0,
                text: text.to_string(),
            },
            score,
        }
    }

    #[test]
    fn test_fuse_preserves_conversation_turns() {
        let fusion = PromptFusion::new(4000);
        let conversation = vec![
            Message::user("Tell me about France."),
            Message::assistant("France is in Europe."),
            Message::user("What about its capital?"),
        ];
        let chunks = vec![scored("doc.txt", "Paris is the capital of France.", 0.9)];

        let messages = fusion.fuse(&chunks, &conversation);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].0, "system");
        assert_eq!(messages[1], ("user".to_string(), "Tell me about France.".to_string()));
        assert_eq!(messages[3].1, "What about its capital?");
    }

    #[test]
    fn test_context_labeled_with_source_ids() {
        let fusion = PromptFusion::new(4000);
        let chunks = vec![
            scored("a.txt", "First excerpt.", 0.9),
            scored("https://example.com", "Second excerpt.", 0.7),
        ];

        let messages = fusion.fuse(&chunks, &[Message::user("q")]);
        let system = &messages[0].1;
        assert!(system.contains("[1] (a.txt)"));
        assert!(system.contains("[2] (https://example.com)"));
        assert!(system.contains("First excerpt."));
    }

    #[test]
    fn test_budget_drops_lowest_similarity_first() {
        let fusion = PromptFusion::new(120);
        let chunks = vec![
            scored("a.txt", &"high relevance text ".repeat(4), 0.9),
            scored("b.txt", &"low relevance filler ".repeat(4), 0.2),
        ];

        let messages = fusion.fuse(&chunks, &[Message::user("q")]);
        let system = &messages[0].1;
        assert!(system.contains("a.txt"));
        assert!(!system.contains("b.txt"));
    }

    #[test]
    fn test_empty_retrieval_notes_missing_context() {
        let fusion = PromptFusion::new(4000);
        let messages = fusion.fuse(&[], &[Message::user("What color is the sky?")]);
        assert!(messages[0].1.contains("no relevant context was found"));
        assert_eq!(messages[1].1, "What color is the sky?");
    }
}
