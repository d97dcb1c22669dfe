//! `config` subcommand: print the resolved settings.

use crate::config;
use anyhow::Result;

pub fn run() -> Result<()> {
    let settings = config::load_settings();

    println!("config file:  {}", config::config_path().display());
    println!("data dir:     {}", settings.data_dir.display());
    println!("metadata db:  {}", settings.data_dir.join("metadata.db").display());
    println!("vector store: {}", settings.data_dir.join("vectors.db").display());
    println!();
    println!("defaults:");
    println!("  token_target:        {}", settings.defaults.token_target);
    println!("  overlap_tokens:      {}", settings.defaults.overlap_tokens);
    println!("  chunk_threshold:     {}", settings.defaults.chunk_threshold);
    println!("  max_file_size_bytes: {}", settings.defaults.max_file_size_bytes);

    if settings.repo_overrides.is_empty() {
        println!("\nno per-repository overrides");
    } else {
        println!("\nper-repository overrides:");
        for (path, patch) in &settings.repo_overrides {
            println!("  {path}: {patch:?}");
        }
    }

    Ok(())
}
