//! Suggest command handler.

use super::print_outcome;
use clap::Args;
use greenguide_core::config::AppConfig;
use greenguide_rag::{DomainId, DomainRegistry};

/// Get suggestions about a topic within a domain
#[derive(Args, Debug)]
pub struct SuggestCommand {
    /// Domain id
    pub domain: u32,

    /// Topic to get suggestions about
    pub topic: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SuggestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let id = DomainId(self.domain);
        let mut registry = DomainRegistry::from_config(config)?;
        registry.open_or_ingest(id).await?;

        let outcome = registry.suggest(id, &self.topic).await?;
        print_outcome(&outcome, self.json)
    }
}
