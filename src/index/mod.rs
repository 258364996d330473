//! Session-scoped vector index.
//!
//! Owns the embedding records for one session: append-only insertion,
//! cosine-similarity search, and introspection for the presentation layer.
//! Insertion under a write lock and search under a read lock are mutually
//! non-corrupting; a search racing an insert may or may not see the new
//! records.

use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AppError, Chunk, EmbeddingRecord, Result, ScoredChunk};
use parking_lot::RwLock;

/// Chunks sent to the embedding provider per request.
const EMBED_BATCH: usize = 64;

/// Outcome of one insert call. Failed chunks are reported, never silently
/// dropped; successfully embedded chunks from other batches are still kept.
#[derive(Debug, Default)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub failures: Vec<(Chunk, AppError)>,
}

#[derive(Default)]
pub struct VectorIndex {
    records: RwLock<Vec<EmbeddingRecord>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Embed `chunks` and append the resulting records.
    ///
    /// Existing records are never overwritten. Embedding failures are
    /// isolated per batch and reported per chunk in the outcome.
    pub async fn insert(
        &self,
        embedder: &dyn EmbeddingProvider,
        chunks: Vec<Chunk>,
    ) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();

        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            match embedder.embed(&texts).await {
                Ok(vectors) if vectors.len() == batch.len() => {
                    let mut records = self.records.write();
                    for (chunk, embedding) in batch.iter().zip(vectors) {
                        records.push(EmbeddingRecord {
                            chunk: chunk.clone(),
                            embedding,
                        });
                        outcome.inserted += 1;
                    }
                }
                Ok(vectors) => {
                    for chunk in batch {
                        outcome.failures.push((
                            chunk.clone(),
                            AppError::Embedding(format!(
                                "provider returned {} vectors for {} texts",
                                vectors.len(),
                                batch.len()
                            )),
                        ));
                    }
                }
                Err(e) => {
                    for chunk in batch {
                        outcome
                            .failures
                            .push((chunk.clone(), AppError::Embedding(e.to_string())));
                    }
                }
            }
        }

        outcome
    }

    /// Return the `k` records most similar to `query_text`, ordered by
    /// descending cosine similarity. `k` is clamped to the index size; an
    /// empty index yields an empty result without an embedding call.
    pub async fn search(
        &self,
        embedder: &dyn EmbeddingProvider,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(AppError::InvalidInput(
                "search k must be a positive integer".to_string(),
            ));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let query = embedder
            .embed(&[query_text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("empty query embedding".to_string()))?;

        let records = self.records.read();
        let mut results: Vec<ScoredChunk> = records
            .iter()
            .map(|record| ScoredChunk {
                chunk: record.chunk.clone(),
                score: cosine_similarity(&query, &record.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Distinct source identifiers across all records, in first-seen order.
    pub fn sources(&self) -> Vec<String> {
        let records = self.records.read();
        let mut seen = std::collections::HashSet::new();
        let mut sources = Vec::new();
        for record in records.iter() {
            if seen.insert(record.chunk.source_id.clone()) {
                sources.push(record.chunk.source_id.clone());
            }
        }
        sources
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic test embedder: bag-of-words hashed into a fixed-size
    /// vector, so identical text always embeds identically.
    struct HashEmbedder;

    const DIMS: usize = 32;

    #[async_trait]
    impl EmbeddingProvider for HashEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; DIMS];
                    for word in text.split_whitespace() {
                        let bucket =
                            word.bytes().fold(0usize, |acc, b| acc * 31 + b as usize) % DIMS;
                        v[bucket] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "hash-test"
        }

        fn dims(&self) -> usize {
            DIMS
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(AppError::Embedding("provider unreachable".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing-test"
        }

        fn dims(&self) -> usize {
            DIMS
        }
    }

    fn chunk(id: &str, source: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            source_id: source.to_string(),
            position: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_size() {
        let index = VectorIndex::new();
        let outcome = index
            .insert(&HashEmbedder, vec![chunk("c1", "doc", "the sky is blue")])
            .await;
        assert_eq!(outcome.inserted, 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_search_empty_index_returns_empty() {
        let index = VectorIndex::new();
        let results = index.search(&HashEmbedder, "anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_zero_k() {
        let index = VectorIndex::new();
        assert!(index.search(&HashEmbedder, "anything", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_search_clamps_k_to_size() {
        let index = VectorIndex::new();
        index
            .insert(
                &HashEmbedder,
                vec![
                    chunk("c1", "doc", "the sky is blue"),
                    chunk("c2", "doc", "water is wet"),
                ],
            )
            .await;

        let results = index.search(&HashEmbedder, "sky", 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_orders_by_descending_similarity() {
        let index = VectorIndex::new();
        index
            .insert(
                &HashEmbedder,
                vec![
                    chunk("c1", "doc", "the sky is blue today"),
                    chunk("c2", "doc", "stock markets closed mixed"),
                    chunk("c3", "doc", "the sky is grey"),
                ],
            )
            .await;

        let results = index
            .search(&HashEmbedder, "what colour is the sky", 3)
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_exact_text_round_trip_ranks_first() {
        let index = VectorIndex::new();
        index
            .insert(
                &HashEmbedder,
                vec![
                    chunk("c1", "doc", "the capital of France is Paris"),
                    chunk("c2", "doc", "completely unrelated gardening notes"),
                ],
            )
            .await;

        let results = index
            .search(&HashEmbedder, "the capital of France is Paris", 2)
            .await
            .unwrap();
        assert_eq!(results[0].chunk.id, "c1");
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_failed_embedding_is_reported_not_dropped() {
        let index = VectorIndex::new();
        let outcome = index
            .insert(&FailingEmbedder, vec![chunk("c1", "doc", "some text")])
            .await;
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(index.len(), 0);
    }

    #[tokio::test]
    async fn test_sources_deduplicated_in_first_seen_order() {
        let index = VectorIndex::new();
        index
            .insert(
                &HashEmbedder,
                vec![
                    chunk("c1", "a.txt", "first"),
                    chunk("c2", "b.txt", "second"),
                    chunk("c3", "a.txt", "third"),
                ],
            )
            .await;
        assert_eq!(index.sources(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
