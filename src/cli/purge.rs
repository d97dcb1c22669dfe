//! `purge` subcommand (§6): remove a repository and its indexed data.

use crate::config;
use crate::store::{MetadataStore, SqliteVectorStore, VectorStore};
use anyhow::Result;
use clap::Args;
use dialoguer::Confirm;

#[derive(Args)]
pub struct PurgeArgs {
    /// Repository name to purge
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn run(args: PurgeArgs) -> Result<()> {
    let settings = config::load_settings();
    let metadata = MetadataStore::open(&settings.data_dir.join("metadata.db"))?;

    let repo = match metadata.get_repo_by_name(&args.name)? {
        Some(repo) => repo,
        None => {
            println!("repository '{}' not found", args.name);
            return Ok(());
        }
    };

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Purge repository '{}'?", repo.name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("aborted");
            return Ok(());
        }
    }

    let mut vectors = SqliteVectorStore::open(&settings.data_dir.join("vectors.db"))?;
    vectors.delete_collection(&repo.collection_name)?;

    metadata.delete_repo(&repo.id)?;
    println!("Purged '{}'. Re-ingest with `repo-indexer ingest {}`.", repo.name, repo.path);

    Ok(())
}
