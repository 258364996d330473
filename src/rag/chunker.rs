//! Text chunking for document ingestion.
//!
//! Splits a source body into overlapping character-budget chunks, preferring
//! paragraph and sentence boundaries near the end of the window before
//! falling back to a hard cut.

use crate::types::Chunk;
use sha2::{Digest, Sha256};

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// `chunk_overlap` is clamped below `chunk_size` so every step makes
    /// forward progress.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Lazily produce the chunks of `text`.
    ///
    /// The returned iterator is finite and restartable (call again for a
    /// fresh pass). Empty or whitespace-only input yields no chunks.
    pub fn chunks(&self, source_id: &str, text: &str) -> Chunks {
        let chars: Vec<char> = if text.trim().is_empty() {
            Vec::new()
        } else {
            text.chars().collect()
        };

        Chunks {
            chars,
            source_id: source_id.to_string(),
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
            start: 0,
            position: 0,
        }
    }
}

/// Iterator over the chunks of a single source body.
pub struct Chunks {
    chars: Vec<char>,
    source_id: String,
    chunk_size: usize,
    overlap: usize,
    start: usize,
    position: usize,
}

impl Chunks {
    /// Look for a paragraph break, then a sentence ending, in the tail 20%
    /// of the window. Returns the cut index after the boundary, or the hard
    /// end when no boundary is found.
    fn natural_cut(&self, start: usize, hard_end: usize) -> usize {
        let window = hard_end - start;
        let floor = start + (window * 4) / 5;

        let mut i = hard_end.saturating_sub(2);
        while i >= floor {
            if self.chars[i] == '\n' && self.chars[i + 1] == '\n' {
                return i + 2;
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }

        let mut i = hard_end.saturating_sub(2);
        while i >= floor {
            if matches!(self.chars[i], '.' | '!' | '?') && self.chars[i + 1].is_whitespace() {
                return i + 2;
            }
            if i == 0 {
                break;
            }
            i -= 1;
        }

        hard_end
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.start >= self.chars.len() {
            return None;
        }

        let hard_end = (self.start + self.chunk_size).min(self.chars.len());
        let end = if hard_end < self.chars.len() {
            self.natural_cut(self.start, hard_end)
        } else {
            hard_end
        };

        let text: String = self.chars[self.start..end].iter().collect();
        let chunk = Chunk {
            id: chunk_id(&self.source_id, self.position, &text),
            source_id: self.source_id.clone(),
            position: self.position,
            text,
        };

        self.position += 1;
        if end >= self.chars.len() {
            self.start = self.chars.len();
        } else {
            // Step back by the overlap so neighbouring chunks share context,
            // but always advance at least one character.
            self.start = end.saturating_sub(self.overlap).max(self.start + 1);
        }

        Some(chunk)
    }
}

/// Stable chunk identifier: content hash over source, ordinal, and text.
fn chunk_id(source_id: &str, position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(position.to_le_bytes());
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}
