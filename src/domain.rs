//! Core data types shared across the indexing pipeline.

use std::collections::BTreeMap;

/// A repository tracked by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub path: String,
    pub collection_name: String,
    pub ingested_at: Option<String>,
}

/// A single file's last-known state inside one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub repository_id: String,
    pub file_path: String,
    pub content_hash: String,
    pub size_bytes: u64,
    pub language: Option<String>,
    pub chunk_count: u64,
    pub skipped: bool,
    pub last_modified: String,
}

/// A leaf or directory node of the repository's Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleNode {
    pub repository_id: String,
    pub node_path: String,
    pub node_hash: String,
    pub is_directory: bool,
}

/// A unit of chunked text ready for the vector store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub chunk_index: usize,
    pub chunk_hash: String,
    pub language: Option<String>,
    pub symbol_name: Option<String>,
    pub symbol_type: Option<String>,
}

/// Result of comparing stored file hashes against the current filesystem state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl Changeset {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

/// Summary returned by a completed (or no-op) ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub chunks: usize,
    pub skipped: usize,
}

/// Per-repository tunables, merged from global defaults and a per-path override.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoConfig {
    pub token_target: usize,
    pub overlap_tokens: usize,
    pub chunk_threshold: usize,
    pub max_file_size_bytes: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            token_target: 500,
            overlap_tokens: 64,
            chunk_threshold: 200,
            max_file_size_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Persisted settings: data directory plus global and per-repository overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: std::path::PathBuf,
    pub defaults: RepoConfig,
    pub repo_overrides: BTreeMap<String, RepoConfigPatch>,
}

/// A sparse override applied on top of [`RepoConfig::default`] for one repository path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoConfigPatch {
    pub token_target: Option<usize>,
    pub overlap_tokens: Option<usize>,
    pub chunk_threshold: Option<usize>,
    pub max_file_size_bytes: Option<u64>,
}

impl Settings {
    pub fn get_repo_config(&self, repo_path: &str) -> RepoConfig {
        let mut cfg = self.defaults.clone();
        if let Some(patch) = self.repo_overrides.get(repo_path) {
            if let Some(v) = patch.token_target {
                cfg.token_target = v;
            }
            if let Some(v) = patch.overlap_tokens {
                cfg.overlap_tokens = v;
            }
            if let Some(v) = patch.chunk_threshold {
                cfg.chunk_threshold = v;
            }
            if let Some(v) = patch.max_file_size_bytes {
                cfg.max_file_size_bytes = v;
            }
        }
        cfg
    }
}
