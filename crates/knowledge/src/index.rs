//! In-memory vector index.

use crate::types::{EmbeddedChunk, ScoredChunk};
use greenguide_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Trait for vector index backends.
///
/// Implementations are read-only after construction and shared across
/// concurrent requests.
pub trait VectorIndex: Send + Sync {
    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending similarity score. An empty index
    /// returns an empty result.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>>;

    /// Number of chunks in the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force cosine similarity over chunks held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    chunks: Vec<EmbeddedChunk>,
    dimensions: Option<usize>,
}

impl MemoryIndex {
    /// Build an index, rejecting chunks whose dimensions disagree.
    pub fn new(chunks: Vec<EmbeddedChunk>) -> AppResult<Self> {
        let dimensions = chunks.first().map(|c| c.embedding.len());

        if let Some(dims) = dimensions {
            if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dims) {
                return Err(AppError::Knowledge(format!(
                    "Chunk {} has {} dimensions, expected {}",
                    bad.chunk.id,
                    bad.embedding.len(),
                    dims
                )));
            }
        }

        Ok(Self { chunks, dimensions })
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

impl VectorIndex for MemoryIndex {
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        let Some(dims) = self.dimensions else {
            return Ok(Vec::new());
        };

        if query_embedding.len() != dims {
            return Err(AppError::Retrieval(format!(
                "Query embedding has {} dimensions, index has {}",
                query_embedding.len(),
                dims
            )));
        }

        let mut results: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // Highest score first, ties broken by chunk id
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        results.truncate(top_k);

        tracing::trace!(
            returned = results.len(),
            top_k,
            "Searched memory index"
        );

        Ok(results)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
