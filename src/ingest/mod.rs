//! Ingest pipeline (C7): orchestrates the walker, hasher, chunker, and
//! differ against the metadata and vector stores (§4.5).

use crate::domain::{Changeset, FileRecord, IngestSummary, MerkleNode, Repository, Settings};
use crate::error::{IndexError, Result};
use crate::store::vector::{VectorItem, VectorStore};
use crate::store::MetadataStore;
use crate::{chunk, diff, hash, scan};
use std::collections::BTreeMap;
use std::path::Path;

/// Lowercase, collapse separators to `-`, strip disallowed characters, and
/// pad/truncate so the result is a valid vector-collection name (§4.5).
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let collapsed: String =
        lower.chars().map(|c| if c == ' ' || c == '/' || c == '.' { '-' } else { c }).collect();
    let mut filtered: String = collapsed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    while filtered.len() < 3 {
        filtered.push('_');
    }
    filtered.truncate(63);
    filtered
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn default_repo_name(repo_path: &Path) -> String {
    repo_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repository")
        .to_string()
}

fn resolve_or_create_repo(
    metadata: &MetadataStore,
    repo_path: &Path,
    name: Option<&str>,
) -> Result<Repository> {
    let path_str = repo_path.to_string_lossy().to_string();
    if let Some(existing) = metadata.get_repo_by_path(&path_str)? {
        return Ok(existing);
    }

    let repo_name = name.map(str::to_string).unwrap_or_else(|| default_repo_name(repo_path));
    if let Some(existing) = metadata.get_repo_by_name(&repo_name)? {
        return Ok(existing);
    }

    let id = hash::hash_string(&format!("{repo_name}:{path_str}:{}", now_rfc3339()))[..32].to_string();
    let collection_name = slugify(&repo_name);
    metadata.create_repo(&id, &repo_name, &path_str, &collection_name)?;
    Ok(Repository { id, name: repo_name, path: path_str, collection_name, ingested_at: None })
}

/// Ingest an entire repository: walk, diff against stored state, chunk
/// every added/modified file, upsert/delete vector-store chunks, and
/// rebuild the Merkle tree.
pub fn ingest_repo(
    metadata: &mut MetadataStore,
    vectors: &mut dyn VectorStore,
    settings: &Settings,
    repo_path: &Path,
    name: Option<&str>,
    force: bool,
) -> Result<IngestSummary> {
    if !repo_path.is_dir() {
        return Err(IndexError::BadInput(format!("{} is not a directory", repo_path.display())));
    }

    let repo = resolve_or_create_repo(metadata, repo_path, name)?;
    let cfg = settings.get_repo_config(&repo.path);

    let walker = scan::Walker::new(repo_path);
    let walk_result = walker.walk(&cfg);

    let mut current_hashes = BTreeMap::new();
    for rel in &walk_result.files {
        let h = hash::hash_file(&repo_path.join(rel));
        if !h.is_empty() {
            current_hashes.insert(rel.clone(), h);
        }
    }

    let stored_hashes = metadata.file_hashes_by_repo(&repo.id)?;

    let changeset = if force {
        Changeset {
            added: current_hashes.keys().cloned().collect(),
            modified: Vec::new(),
            deleted: stored_hashes
                .keys()
                .filter(|p| !current_hashes.contains_key(*p))
                .cloned()
                .collect(),
        }
    } else {
        diff::compute_changeset(&stored_hashes, &current_hashes)
    };

    if !changeset.has_changes() && !force {
        metadata.update_repo_ingested_at(&repo.id, &now_rfc3339())?;
        return Ok(IngestSummary::default());
    }

    let mut chunks_upserted = 0usize;
    let now = now_rfc3339();

    for rel in changeset.added.iter().chain(changeset.modified.iter()) {
        if changeset.modified.contains(rel) {
            vectors.delete_by_metadata(&repo.collection_name, "file_path", rel)?;
        }

        let abs = repo_path.join(rel);
        let content = match crate::utils::read_file_safe(&abs, None, None) {
            Ok((content, _encoding)) => content,
            Err(_) => continue,
        };

        let file_chunks = chunk::chunk_file(rel, &content, cfg.token_target, cfg.overlap_tokens);
        let items: Vec<VectorItem> = file_chunks
            .iter()
            .map(|c| {
                let mut meta = BTreeMap::new();
                meta.insert("file_path".to_string(), rel.clone());
                meta.insert("start_line".to_string(), c.start_line.to_string());
                meta.insert("end_line".to_string(), c.end_line.to_string());
                meta.insert("chunk_index".to_string(), c.chunk_index.to_string());
                if let Some(lang) = &c.language {
                    meta.insert("language".to_string(), lang.clone());
                }
                if let Some(s) = &c.symbol_name {
                    meta.insert("symbol_name".to_string(), s.clone());
                }
                if let Some(s) = &c.symbol_type {
                    meta.insert("symbol_type".to_string(), s.clone());
                }
                VectorItem { id: c.chunk_hash.clone(), document: c.content.clone(), metadata: meta }
            })
            .collect();

        if !items.is_empty() {
            vectors.upsert(&repo.collection_name, &items)?;
        }
        chunks_upserted += items.len();

        let language = file_chunks.first().and_then(|c| c.language.clone());
        metadata.upsert_file(&FileRecord {
            repository_id: repo.id.clone(),
            file_path: rel.clone(),
            content_hash: current_hashes.get(rel).cloned().unwrap_or_default(),
            size_bytes: content.len() as u64,
            language,
            chunk_count: file_chunks.len() as u64,
            skipped: false,
            last_modified: now.clone(),
        })?;
    }

    for rel in &changeset.deleted {
        vectors.delete_by_metadata(&repo.collection_name, "file_path", rel)?;
    }
    if !changeset.deleted.is_empty() {
        metadata.delete_files_by_paths(&repo.id, &changeset.deleted)?;
    }

    for (rel, reason) in &walk_result.skipped {
        metadata.upsert_file(&FileRecord {
            repository_id: repo.id.clone(),
            file_path: rel.clone(),
            content_hash: String::new(),
            size_bytes: 0,
            language: None,
            chunk_count: 0,
            skipped: true,
            last_modified: reason.clone(),
        })?;
    }

    let tree = hash::build_tree(&current_hashes);
    let nodes: Vec<MerkleNode> = tree
        .into_iter()
        .map(|(path, node)| MerkleNode {
            repository_id: repo.id.clone(),
            node_path: path,
            node_hash: node.hash,
            is_directory: node.is_directory,
        })
        .collect();
    if !nodes.is_empty() {
        metadata.batch_upsert_merkle_nodes(&nodes)?;
    }
    if !changeset.deleted.is_empty() {
        metadata.delete_merkle_nodes_by_paths(&repo.id, &changeset.deleted)?;
    }

    metadata.update_repo_ingested_at(&repo.id, &now)?;

    Ok(IngestSummary {
        added: changeset.added.len(),
        modified: changeset.modified.len(),
        deleted: changeset.deleted.len(),
        chunks: chunks_upserted,
        skipped: walk_result.skipped.len(),
    })
}

/// Force-index a specific list of files against an existing repository,
/// bypassing the walker's size/chunk-threshold skip logic and the Merkle
/// tree entirely (§4.5, §9 — an accepted escape hatch that can drift file
/// rows out of sync with Merkle leaves if relied on repeatedly).
pub fn ingest_files(
    metadata: &mut MetadataStore,
    vectors: &mut dyn VectorStore,
    settings: &Settings,
    repo_name: &str,
    files: &[std::path::PathBuf],
    threshold: Option<usize>,
) -> Result<(usize, usize)> {
    let repo = metadata
        .get_repo_by_name(repo_name)?
        .ok_or_else(|| IndexError::NotFound(format!("repository '{repo_name}' not found")))?;

    let mut cfg = settings.get_repo_config(&repo.path);
    if let Some(t) = threshold {
        cfg.chunk_threshold = t;
    }

    let mut files_processed = 0usize;
    let mut chunks_total = 0usize;
    let now = now_rfc3339();
    let repo_root = Path::new(&repo.path);

    for abs in files {
        let rel = abs
            .strip_prefix(repo_root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| abs.to_string_lossy().to_string());
        let rel = crate::utils::paths::normalize_path(&rel);

        vectors.delete_by_metadata(&repo.collection_name, "file_path", &rel)?;

        let content = match crate::utils::read_file_safe(abs, None, None) {
            Ok((content, _encoding)) => content,
            Err(_) => continue,
        };

        let file_chunks = chunk::chunk_file(&rel, &content, cfg.token_target, cfg.overlap_tokens);
        let items: Vec<VectorItem> = file_chunks
            .iter()
            .map(|c| {
                let mut meta = BTreeMap::new();
                meta.insert("file_path".to_string(), rel.clone());
                meta.insert("start_line".to_string(), c.start_line.to_string());
                meta.insert("end_line".to_string(), c.end_line.to_string());
                meta.insert("chunk_index".to_string(), c.chunk_index.to_string());
                VectorItem { id: c.chunk_hash.clone(), document: c.content.clone(), metadata: meta }
            })
            .collect();

        if !items.is_empty() {
            vectors.upsert(&repo.collection_name, &items)?;
        }
        chunks_total += items.len();
        files_processed += 1;

        metadata.upsert_file(&FileRecord {
            repository_id: repo.id.clone(),
            file_path: rel.clone(),
            content_hash: hash::hash_file(abs),
            size_bytes: content.len() as u64,
            language: file_chunks.first().and_then(|c| c.language.clone()),
            chunk_count: file_chunks.len() as u64,
            skipped: false,
            last_modified: now.clone(),
        })?;
    }

    Ok((files_processed, chunks_total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_collapses_separators() {
        assert_eq!(slugify("My Repo/Name"), "my-repo-name");
    }

    #[test]
    fn slugify_pads_short_names() {
        assert_eq!(slugify("a"), "a__");
    }

    #[test]
    fn slugify_truncates_to_63_chars() {
        let long = "x".repeat(100);
        assert_eq!(slugify(&long).len(), 63);
    }

    #[test]
    fn slugify_strips_disallowed_characters() {
        assert_eq!(slugify("weird!!name??"), "weirdname");
    }
}
