//! `ingest-file` subcommand (§6): force-index specific files.

use crate::config;
use crate::ingest;
use crate::store::{MetadataStore, SqliteVectorStore};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct IngestFileArgs {
    /// Files to index
    pub files: Vec<PathBuf>,

    /// Repository these files belong to
    #[arg(long)]
    pub repo: String,

    /// Override the chunk-count threshold for these files
    #[arg(long)]
    pub threshold: Option<usize>,
}

pub fn run(args: IngestFileArgs) -> Result<()> {
    let settings = config::load_settings();
    let mut metadata = MetadataStore::open(&settings.data_dir.join("metadata.db"))?;
    let mut vectors = SqliteVectorStore::open(&settings.data_dir.join("vectors.db"))?;

    let (files, chunks) = ingest::ingest_files(
        &mut metadata,
        &mut vectors,
        &settings,
        &args.repo,
        &args.files,
        args.threshold,
    )?;

    println!("Done! {files} files processed, {chunks} chunks indexed");
    Ok(())
}
