//! Command handlers for the GreenGuide CLI.

pub mod ask;
pub mod domains;
pub mod ingest;
pub mod stats;
pub mod suggest;

pub use ask::AskCommand;
pub use domains::DomainsCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
pub use suggest::SuggestCommand;

use greenguide_rag::RunOutcome;

/// Print a run result as plain text or JSON.
pub(crate) fn print_outcome(outcome: &RunOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome.response);
    }
    Ok(())
}
