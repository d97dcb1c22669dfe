//! `init` subcommand: ensure the config file and data stores exist.

use crate::config;
use crate::store::MetadataStore;
use anyhow::Result;

pub fn run() -> Result<()> {
    let settings = config::load_settings();
    std::fs::create_dir_all(&settings.data_dir)?;

    let config_path = config::config_path();
    if !config_path.exists() {
        config::save_settings(&settings)?;
        println!("wrote {}", config_path.display());
    } else {
        println!("config already exists at {}", config_path.display());
    }

    let db_path = settings.data_dir.join("metadata.db");
    MetadataStore::open(&db_path)?;
    println!("metadata store ready at {}", db_path.display());

    Ok(())
}
