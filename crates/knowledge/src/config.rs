//! Per-domain index manifest and on-disk layout.
//!
//! Each domain keeps its index under
//! `<workspace>/.greenguide/knowledge/domain-<id>/`:
//! - `index.sqlite` holds sources, chunks and embeddings
//! - `config.yaml` records how the index was built

use chrono::{DateTime, Utc};
use greenguide_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How a domain index was built.
///
/// Queries must be embedded with the same provider, model and dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexManifest {
    pub domain_id: u32,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Check that `provider`/`model`/`dimensions` match what built the index.
    pub fn validate_embedder(&self, provider: &str, model: &str, dimensions: usize) -> AppResult<()> {
        if self.provider != provider || self.model != model || self.dimensions != dimensions {
            return Err(AppError::Knowledge(format!(
                "Index for domain {} was built with {}/{} ({} dims) but the configured embedder is {}/{} ({} dims); run ingest again",
                self.domain_id,
                self.provider,
                self.model,
                self.dimensions,
                provider,
                model,
                dimensions
            )));
        }
        Ok(())
    }
}

/// Load the manifest for a domain, if the domain has been built.
pub fn load_manifest(workspace: &Path, domain_id: u32) -> AppResult<Option<IndexManifest>> {
    let config_path = get_config_path(workspace, domain_id);

    if !config_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
    })?;

    let manifest: IndexManifest = serde_yaml::from_str(&content).map_err(|e| {
        AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
    })?;

    tracing::debug!(domain_id, "Loaded index manifest");
    Ok(Some(manifest))
}

/// Save the manifest for a domain.
pub fn save_manifest(workspace: &Path, manifest: &IndexManifest) -> AppResult<()> {
    let config_path = get_config_path(workspace, manifest.domain_id);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create index directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(manifest)
        .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!(domain_id = manifest.domain_id, "Saved index manifest");
    Ok(())
}

/// Get the directory holding a domain's index.
pub fn get_base_dir(workspace: &Path, domain_id: u32) -> PathBuf {
    workspace
        .join(".greenguide")
        .join("knowledge")
        .join(format!("domain-{}", domain_id))
}

/// Get the path to a domain's manifest.
pub fn get_config_path(workspace: &Path, domain_id: u32) -> PathBuf {
    get_base_dir(workspace, domain_id).join("config.yaml")
}

/// Get the SQLite index path for a domain.
pub fn get_index_path(workspace: &Path, domain_id: u32) -> PathBuf {
    get_base_dir(workspace, domain_id).join("index.sqlite")
}
