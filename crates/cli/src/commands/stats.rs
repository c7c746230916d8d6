//! Stats command handler.

use clap::Args;
use greenguide_core::config::AppConfig;
use greenguide_rag::{DomainId, DomainRegistry};

/// Show index statistics for a domain
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Domain id
    pub domain: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let registry = DomainRegistry::from_config(config)?;
        let stats = registry.stats(DomainId(self.domain))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            let label = registry.domain(DomainId(self.domain))?.label.clone();
            println!("Domain {} ({})", stats.domain_id, label);
            println!("  Sources:    {}", stats.sources_count);
            println!("  Chunks:     {}", stats.chunks_count);
            println!("  Index size: {} bytes", stats.db_size_bytes);
            println!(
                "  Embeddings: {}/{}",
                stats.embedding_provider, stats.embedding_model
            );
            println!("  Built at:   {}", stats.built_at.to_rfc3339());
        }

        Ok(())
    }
}
