//! Ask command handler.

use super::print_outcome;
use anyhow::Context;
use clap::Args;
use greenguide_core::config::AppConfig;
use greenguide_llm::ImageData;
use greenguide_rag::{DomainId, DomainRegistry};
use std::path::PathBuf;

/// Ask a question within a domain
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Domain id (see `greenguide domains`)
    pub domain: u32,

    /// The question to ask
    pub question: String,

    /// Image to ask about
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Output as JSON (includes grade and path)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command for domain {}", self.domain);

        let image = match &self.image {
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                Some(ImageData::from_bytes(bytes))
            }
            None => None,
        };

        let id = DomainId(self.domain);
        let mut registry = DomainRegistry::from_config(config)?;
        registry.open_or_ingest(id).await?;

        let outcome = registry.run_traced(id, &self.question, image).await?;
        tracing::debug!(grade = %outcome.grade, path = ?outcome.path, "Answered");

        print_outcome(&outcome, self.json)
    }
}
