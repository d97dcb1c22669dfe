//! `repos` subcommand: list indexed repositories.

use crate::config;
use crate::store::MetadataStore;
use anyhow::Result;

pub fn run() -> Result<()> {
    let settings = config::load_settings();
    let metadata = MetadataStore::open(&settings.data_dir.join("metadata.db"))?;

    let repos = metadata.list_repos()?;
    if repos.is_empty() {
        println!("no repositories indexed yet");
        return Ok(());
    }

    for repo in repos {
        let file_count = metadata.get_file_count(&repo.id)?;
        let ingested = repo.ingested_at.as_deref().unwrap_or("never");
        println!("{}  {}  {} files  ingested: {}", repo.name, repo.path, file_count, ingested);
    }

    Ok(())
}
