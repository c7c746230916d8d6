//! Ingest command handler.

use anyhow::bail;
use clap::Args;
use greenguide_core::config::AppConfig;
use greenguide_rag::{DomainId, DomainRegistry};
use std::path::PathBuf;

/// Build or rebuild domain indexes
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Domain to ingest (default: all configured domains)
    #[arg(short, long)]
    pub domain: Option<u32>,

    /// Document folder to ingest instead of the configured one
    #[arg(short, long, requires = "domain")]
    pub folder: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command");

        let mut registry = DomainRegistry::from_config(config)?;

        let targets: Vec<(DomainId, PathBuf)> = match self.domain {
            Some(id) => {
                let id = DomainId(id);
                let folder = match &self.folder {
                    Some(folder) => folder.clone(),
                    None => registry.domain(id)?.documents.clone(),
                };
                vec![(id, folder)]
            }
            None => registry
                .domains()
                .into_iter()
                .map(|d| (d.id, d.documents.clone()))
                .collect(),
        };

        if targets.is_empty() {
            bail!("No domains are configured");
        }

        let mut reports = Vec::new();
        for (id, folder) in targets {
            let stats = registry.ingest(id, &folder).await?;

            if self.json {
                reports.push(serde_json::json!({
                    "domain": id,
                    "folder": folder,
                    "sourcesCount": stats.sources_count,
                    "chunksCount": stats.chunks_count,
                    "skippedCount": stats.skipped_count,
                    "bytesProcessed": stats.bytes_processed,
                    "durationSecs": stats.duration_secs,
                }));
            } else {
                println!(
                    "Domain {}: indexed {} sources ({} chunks, {} skipped) in {:.2}s",
                    id,
                    stats.sources_count,
                    stats.chunks_count,
                    stats.skipped_count,
                    stats.duration_secs
                );
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }

        Ok(())
    }
}
