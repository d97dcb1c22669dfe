//! repo-indexer: a local, incremental code-indexing engine.

use anyhow::Result;

fn main() -> Result<()> {
    repo_indexer::cli::run()
}
