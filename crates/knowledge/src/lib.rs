//! Per-domain knowledge indexes.
//!
//! Each domain's document folder is parsed, chunked and embedded into a
//! SQLite index under the workspace. At query time the index is loaded into
//! memory and searched by cosine similarity.

pub mod chunker;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod retriever;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::IndexManifest;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::{MemoryIndex, VectorIndex};
pub use retriever::{format_context, Retriever};
pub use types::{
    BuildOptions, BuildStats, IndexStats, KnowledgeChunk, KnowledgeSource, ScoredChunk,
    SkippedFile,
};

use chrono::Utc;
use embeddings::embed_in_batches;
use greenguide_core::{AppError, AppResult, Stage};
use std::path::Path;
use std::time::Instant;
use store::IndexStore;
use types::EmbeddedChunk;

/// Build (or rebuild) the index for one domain from its document folder.
///
/// The previous index contents are replaced, so rebuilding from unchanged
/// documents yields the same chunks. Returns the in-memory index ready for
/// queries together with build statistics.
pub async fn build_index(
    workspace: &Path,
    domain_id: u32,
    folder: &Path,
    embedder: &dyn EmbeddingProvider,
    options: BuildOptions,
) -> AppResult<(MemoryIndex, BuildStats)> {
    let start = Instant::now();

    tracing::info!("Building index for domain {} from {:?}", domain_id, folder);

    let corpus = corpus::load_corpus(folder, &options).map_err(|e| e.in_stage(Stage::Ingestion))?;

    let texts: Vec<String> = corpus.chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embed_in_batches(embedder, &texts, options.batch_size)
        .await
        .map_err(|e| e.in_stage(Stage::Ingestion))?;

    let entries: Vec<EmbeddedChunk> = corpus
        .chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
        .collect();

    let mut store = IndexStore::open(&config::get_index_path(workspace, domain_id))?;
    store.replace_all(&corpus.sources, &entries)?;

    config::save_manifest(
        workspace,
        &IndexManifest {
            domain_id,
            provider: embedder.provider_name().to_string(),
            model: embedder.model_name().to_string(),
            dimensions: embedder.dimensions(),
            chunk_size: options.chunk_size,
            chunk_overlap: options.chunk_overlap,
            built_at: Utc::now(),
        },
    )?;

    let stats = BuildStats {
        sources_count: corpus.sources.len() as u32,
        chunks_count: entries.len() as u32,
        skipped_count: corpus.skipped.len() as u32,
        bytes_processed: corpus.bytes_processed,
        duration_secs: start.elapsed().as_secs_f64(),
    };

    if stats.chunks_count == 0 {
        tracing::warn!("Domain {} has no indexed content", domain_id);
    }

    tracing::info!(
        "Indexed domain {}: {} sources, {} chunks, {} skipped in {:.2}s",
        domain_id,
        stats.sources_count,
        stats.chunks_count,
        stats.skipped_count,
        stats.duration_secs
    );

    Ok((MemoryIndex::new(entries)?, stats))
}

/// Whether a built index exists for the domain.
pub fn index_exists(workspace: &Path, domain_id: u32) -> bool {
    config::get_config_path(workspace, domain_id).exists()
        && config::get_index_path(workspace, domain_id).exists()
}

/// Load a previously built index into memory.
///
/// Fails when the configured embedder differs from the one that built the
/// index, since query and chunk vectors would not be comparable.
pub fn open_index(
    workspace: &Path,
    domain_id: u32,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<MemoryIndex> {
    let manifest = config::load_manifest(workspace, domain_id)?.ok_or_else(|| {
        AppError::Knowledge(format!(
            "No index for domain {}; run ingest first",
            domain_id
        ))
    })?;

    manifest.validate_embedder(
        embedder.provider_name(),
        embedder.model_name(),
        embedder.dimensions(),
    )?;

    let store = IndexStore::open(&config::get_index_path(workspace, domain_id))?;
    let index = MemoryIndex::new(store.load_chunks()?)?;

    tracing::debug!("Loaded {} chunks for domain {}", index.len(), domain_id);
    Ok(index)
}

/// Get statistics for a built domain index.
pub fn stats(workspace: &Path, domain_id: u32) -> AppResult<IndexStats> {
    let manifest = config::load_manifest(workspace, domain_id)?.ok_or_else(|| {
        AppError::Knowledge(format!("No index for domain {}", domain_id))
    })?;

    let index_path = config::get_index_path(workspace, domain_id);
    let store = IndexStore::open(&index_path)?;
    let (sources_count, chunks_count) = store.counts()?;
    let db_size_bytes = std::fs::metadata(&index_path)
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(IndexStats {
        domain_id,
        sources_count,
        chunks_count,
        db_size_bytes,
        embedding_provider: manifest.provider,
        embedding_model: manifest.model,
        built_at: manifest.built_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embeddings::providers::trigram::TrigramProvider;
    use std::fs;
    use tempfile::TempDir;

    fn write_docs(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("olives.txt"),
            "Olive trees tolerate drought. Prune olive trees after harvest to keep them productive.",
        )
        .unwrap();
        fs::write(
            dir.join("wheat.md"),
            "# Wheat\n\nWheat is sown in late autumn and harvested in early summer.",
        )
        .unwrap();
        fs::write(dir.join("notes.xyz"), "unsupported").unwrap();
    }

    #[tokio::test]
    async fn test_build_then_open() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        write_docs(&docs);
        let embedder = TrigramProvider::new(128);

        let (index, stats) = build_index(temp.path(), 1, &docs, &embedder, BuildOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(index.len(), stats.chunks_count as usize);
        assert!(index_exists(temp.path(), 1));

        let reopened = open_index(temp.path(), 1, &embedder).unwrap();
        assert_eq!(reopened.len(), index.len());
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        write_docs(&docs);
        let embedder = TrigramProvider::new(64);

        build_index(temp.path(), 2, &docs, &embedder, BuildOptions::default())
            .await
            .unwrap();
        let first = IndexStore::open(&config::get_index_path(temp.path(), 2))
            .unwrap()
            .load_chunks()
            .unwrap();

        build_index(temp.path(), 2, &docs, &embedder, BuildOptions::default())
            .await
            .unwrap();
        let second = IndexStore::open(&config::get_index_path(temp.path(), 2))
            .unwrap()
            .load_chunks()
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_folder_builds_empty_index() {
        let temp = TempDir::new().unwrap();
        let embedder = TrigramProvider::new(32);

        let (index, stats) = build_index(
            temp.path(),
            3,
            &temp.path().join("nowhere"),
            &embedder,
            BuildOptions::default(),
        )
        .await
        .unwrap();

        assert!(index.is_empty());
        assert_eq!(stats.chunks_count, 0);
        assert!(index.search(&[0.0; 32], 1).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_rejects_different_embedder() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        write_docs(&docs);

        build_index(temp.path(), 1, &docs, &TrigramProvider::new(64), BuildOptions::default())
            .await
            .unwrap();

        let err = open_index(temp.path(), 1, &TrigramProvider::new(128)).unwrap_err();
        assert!(err.to_string().contains("run ingest again"));
    }

    #[test]
    fn test_open_without_build() {
        let temp = TempDir::new().unwrap();
        assert!(!index_exists(temp.path(), 9));
        assert!(open_index(temp.path(), 9, &TrigramProvider::new(8)).is_err());
        assert!(stats(temp.path(), 9).is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        write_docs(&docs);

        build_index(temp.path(), 1, &docs, &TrigramProvider::new(64), BuildOptions::default())
            .await
            .unwrap();

        let stats = stats(temp.path(), 1).unwrap();
        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.embedding_provider, "trigram");
        assert_eq!(stats.embedding_model, "trigram-v1");
        assert!(stats.db_size_bytes > 0);
    }
}
