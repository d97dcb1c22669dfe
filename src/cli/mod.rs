//! Command-line interface (§6, §10).

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config_cmd;
mod init;
mod ingest_cmd;
mod ingest_file;
mod purge;
mod repos;
mod status;

/// Incrementally index repositories into a local metadata and vector store.
#[derive(Parser)]
#[command(name = "repo-indexer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Config,
    /// Create the config file and data stores if they do not exist
    Init,
    /// List indexed repositories
    Repos,
    /// Ingest (or re-ingest) a repository
    Ingest(ingest_cmd::IngestArgs),
    /// Force-index specific files, bypassing walker skip rules
    IngestFile(ingest_file::IngestFileArgs),
    /// Show the pending changeset for a repository without ingesting
    Status(status::StatusArgs),
    /// Remove a repository and its indexed data
    Purge(purge::PurgeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Config => config_cmd::run(),
        Commands::Init => init::run(),
        Commands::Repos => repos::run(),
        Commands::Ingest(args) => ingest_cmd::run(args),
        Commands::IngestFile(args) => ingest_file::run(args),
        Commands::Status(args) => status::run(args),
        Commands::Purge(args) => purge::run(args),
    }
}
