//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source document that contributed chunks to a domain index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Stable identifier derived from the relative path
    pub id: String,

    /// Path relative to the domain's document folder
    pub path: String,

    /// Detected content type ("pdf", "markdown", "html", "text")
    pub content_type: String,

    /// Extracted text size in bytes
    pub size_bytes: u64,
}

/// A bounded span of source text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// SHA-256 of (source path, position, text)
    pub id: String,

    /// Source document ID
    pub source_id: String,

    /// Source path, kept for traceability
    pub source_path: String,

    /// Position within source
    pub position: u32,

    /// Text content
    pub text: String,
}

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: KnowledgeChunk,
    pub embedding: Vec<f32>,
}

/// A retrieved chunk and its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub score: f32,
}

/// A file the corpus walk could not use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Options controlling how a domain index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,

    /// Maximum texts per embedding request
    pub batch_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            batch_size: 64,
        }
    }
}

/// Statistics from a build operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of sources indexed
    pub sources_count: u32,

    /// Number of chunks created
    pub chunks_count: u32,

    /// Files skipped as unreadable or unsupported
    pub skipped_count: u32,

    /// Total extracted bytes
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Diagnostics for a persisted domain index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub domain_id: u32,
    pub sources_count: u32,
    pub chunks_count: u32,
    pub db_size_bytes: u64,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
}
