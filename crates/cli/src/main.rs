//! GreenGuide CLI
//!
//! Main entry point for the greenguide command-line tool.
//! Builds domain indexes and answers questions against them.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, DomainsCommand, IngestCommand, StatsCommand, SuggestCommand};
use greenguide_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// GreenGuide - domain question answering over local documents
#[derive(Parser, Debug)]
#[command(name = "greenguide")]
#[command(about = "Domain question answering over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "GREENGUIDE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "GREENGUIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Chat provider (ollama, openai)
    #[arg(short, long, global = true, env = "GREENGUIDE_PROVIDER")]
    provider: Option<String>,

    /// Chat model identifier
    #[arg(short, long, global = true, env = "GREENGUIDE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build or rebuild domain indexes
    Ingest(IngestCommand),

    /// Ask a question within a domain
    Ask(AskCommand),

    /// Get suggestions about a topic within a domain
    Suggest(SuggestCommand),

    /// List configured domains
    Domains(DomainsCommand),

    /// Show index statistics for a domain
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and the default config file
    let mut config = AppConfig::load()?;
    if let Some(path) = &cli.config {
        config = config.merge_yaml(path)?;
    }

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("GreenGuide CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);
    tracing::debug!("Model: {}", config.llm.model);

    config.validate()?;
    config.ensure_greenguide_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::Suggest(_) => "suggest",
        Commands::Domains(_) => "domains",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Suggest(cmd) => cmd.execute(&config).await,
        Commands::Domains(cmd) => cmd.execute(&config),
        Commands::Stats(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
