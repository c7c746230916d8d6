//! Sentence-aware text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;
use greenguide_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk text into overlapping segments of at most `chunk_size` characters.
///
/// Splits prefer sentence and paragraph boundaries; whitespace-only chunks
/// are dropped and positions stay contiguous.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> AppResult<Vec<ChunkCandidate>> {
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk settings: {}", e)))?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<ChunkCandidate> = splitter
        .chunks(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .enumerate()
        .map(|(position, chunk)| ChunkCandidate {
            position: position as u32,
            text: chunk.to_string(),
        })
        .collect();

    tracing::trace!(
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "Chunked text"
    );

    Ok(chunks)
}

/// Stable chunk identity: SHA-256 over source path, position and text.
pub fn chunk_id(source_path: &str, position: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(position.to_le_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable source identity: SHA-256 of the relative path.
pub fn source_id(source_path: &str) -> String {
    format!("{:x}", Sha256::digest(source_path.as_bytes()))
}
