//! `ingest` subcommand (§6).

use crate::config;
use crate::ingest;
use crate::store::{MetadataStore, SqliteVectorStore};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct IngestArgs {
    /// Path to the repository to ingest
    pub path: PathBuf,

    /// Repository name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,

    /// Re-ingest every file, ignoring the stored changeset
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let settings = config::load_settings();
    let mut metadata = MetadataStore::open(&settings.data_dir.join("metadata.db"))?;
    let mut vectors = SqliteVectorStore::open(&settings.data_dir.join("vectors.db"))?;

    let summary = ingest::ingest_repo(
        &mut metadata,
        &mut vectors,
        &settings,
        &args.path,
        args.name.as_deref(),
        args.force,
    )?;

    println!(
        "+{} added, ~{} modified, -{} deleted",
        summary.added, summary.modified, summary.deleted
    );
    println!("{} chunks indexed, {} files skipped", summary.chunks, summary.skipped);

    Ok(())
}
