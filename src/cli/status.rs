//! `status` subcommand (§6): show the pending changeset without ingesting.

use crate::config;
use crate::domain::Repository;
use crate::store::MetadataStore;
use crate::{diff, hash, scan};
use anyhow::Result;
use clap::Args;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Args)]
pub struct StatusArgs {
    /// Only check this repository (defaults to all)
    #[arg(long)]
    pub repo: Option<String>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let settings = config::load_settings();
    let metadata = MetadataStore::open(&settings.data_dir.join("metadata.db"))?;

    let repos: Vec<Repository> = match &args.repo {
        Some(name) => match metadata.get_repo_by_name(name)? {
            Some(repo) => vec![repo],
            None => {
                println!("repository '{name}' not found");
                return Ok(());
            }
        },
        None => metadata.list_repos()?,
    };

    for repo in repos {
        println!("{}:", repo.name);
        let cfg = settings.get_repo_config(&repo.path);
        let walker = scan::Walker::new(Path::new(&repo.path));
        let walk_result = walker.walk(&cfg);

        let mut current = BTreeMap::new();
        for rel in &walk_result.files {
            let h = hash::hash_file(&Path::new(&repo.path).join(rel));
            if !h.is_empty() {
                current.insert(rel.clone(), h);
            }
        }
        let stored = metadata.file_hashes_by_repo(&repo.id)?;
        let changeset = diff::compute_changeset(&stored, &current);

        if !changeset.has_changes() {
            println!("  up to date");
            continue;
        }

        print_section("added", &changeset.added);
        print_section("modified", &changeset.modified);
        print_section("deleted", &changeset.deleted);
    }

    Ok(())
}

fn print_section(label: &str, paths: &[String]) {
    if paths.is_empty() {
        return;
    }
    println!("  {label} ({}):", paths.len());
    for path in paths.iter().take(10) {
        println!("    {path}");
    }
    if paths.len() > 10 {
        println!("    ... and {} more", paths.len() - 10);
    }
}
