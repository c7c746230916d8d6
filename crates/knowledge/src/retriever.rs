//! Question-to-context retrieval over a domain index.

use crate::embeddings::{check_dimensions, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::types::ScoredChunk;
use greenguide_core::{AppResult, Stage};
use std::sync::Arc;

/// Embeds questions and looks up the nearest chunks in one domain's index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Return the `top_k` chunks most similar to `question`.
    ///
    /// An empty index returns no chunks without calling the embedder.
    /// Failures are reported as retrieval errors.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<ScoredChunk>> {
        if self.index.is_empty() {
            tracing::debug!("Index is empty; skipping retrieval");
            return Ok(Vec::new());
        }

        let embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| e.in_stage(Stage::Retrieval))?;
        check_dimensions(self.embedder.as_ref(), &embedding)
            .map_err(|e| e.in_stage(Stage::Retrieval))?;

        let results = self
            .index
            .search(&embedding, self.top_k)
            .map_err(|e| e.in_stage(Stage::Retrieval))?;

        tracing::debug!(
            retrieved = results.len(),
            best_score = results.first().map(|r| r.score),
            "Retrieved context"
        );

        Ok(results)
    }
}

/// Concatenate retrieved chunk texts into a single context block.
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}
