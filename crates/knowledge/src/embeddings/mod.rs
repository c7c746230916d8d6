//! Embedding providers for domain indexes.
//!
//! The same provider, model and dimensions must be used to build an index
//! and to embed the questions asked against it.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use greenguide_core::{AppError, AppResult};

/// Embed `texts` in batches of at most `batch_size`, checking shape.
///
/// Every returned vector has `provider.dimensions()` entries and the output
/// has one vector per input text, in input order.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> AppResult<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size.max(1)) {
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(AppError::Llm(format!(
                "Embedding provider '{}' returned {} vectors for {} texts",
                provider.provider_name(),
                vectors.len(),
                batch.len()
            )));
        }
        for vector in &vectors {
            check_dimensions(provider, vector)?;
        }
        embeddings.extend(vectors);
    }

    tracing::debug!(
        count = embeddings.len(),
        provider = provider.provider_name(),
        model = provider.model_name(),
        "Generated embeddings"
    );

    Ok(embeddings)
}

/// Fail when `vector` does not have the provider's declared dimensions.
pub fn check_dimensions(provider: &dyn EmbeddingProvider, vector: &[f32]) -> AppResult<()> {
    if vector.len() != provider.dimensions() {
        return Err(AppError::Llm(format!(
            "Embedding dimension mismatch from '{}': got {}, expected {}",
            provider.provider_name(),
            vector.len(),
            provider.dimensions()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let provider = TrigramProvider::new(64);
        let texts: Vec<String> = (0..5).map(|i| format!("olive harvest number {}", i)).collect();

        let batched = embed_in_batches(&provider, &texts, 2).await.unwrap();
        let single = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batched.len(), 5);
        assert_eq!(batched, single);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let provider = TrigramProvider::new(64);
        assert!(embed_in_batches(&provider, &[], 8).await.unwrap().is_empty());
    }

    #[test]
    fn test_check_dimensions() {
        let provider = TrigramProvider::new(4);
        assert!(check_dimensions(&provider, &[0.0; 4]).is_ok());
        assert!(check_dimensions(&provider, &[0.0; 3]).is_err());
    }
}
