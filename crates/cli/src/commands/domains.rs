//! Domains command handler.

use clap::Args;
use greenguide_core::config::AppConfig;

/// List configured domains
#[derive(Args, Debug)]
pub struct DomainsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DomainsCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        let rows: Vec<_> = config
            .domains
            .iter()
            .map(|d| {
                let built = greenguide_knowledge::index_exists(&config.workspace, d.id);
                (d, d.documents_path(&config.workspace), built)
            })
            .collect();

        if self.json {
            let output: Vec<_> = rows
                .iter()
                .map(|(d, documents, built)| {
                    serde_json::json!({
                        "id": d.id,
                        "label": d.label,
                        "documents": documents,
                        "indexed": built,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for (d, documents, built) in rows {
                let status = if built { "indexed" } else { "not indexed" };
                println!("{}  {}  ({}, {})", d.id, d.label, documents.display(), status);
            }
        }

        Ok(())
    }
}
