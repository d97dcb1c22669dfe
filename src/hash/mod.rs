//! Content-addressed hashing and Merkle tree construction (C1).

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

const BLOCK_SIZE: usize = 64 * 1024;

/// Hash an arbitrary byte stream, reading in 64 KiB blocks so large files
/// never sit fully in memory. Returns lowercase hex.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; BLOCK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash a file on disk. An unreadable file yields the empty string, which the
/// walker and pipeline treat as "skip, unreadable".
pub fn hash_file(path: &Path) -> String {
    match std::fs::File::open(path) {
        Ok(f) => hash_reader(f).unwrap_or_default(),
        Err(_) => String::new(),
    }
}

pub fn hash_string(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A node in the constructed Merkle tree: its hash and whether it is a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub hash: String,
    pub is_directory: bool,
}

/// Build a Merkle tree from a mapping of relative file path to content hash.
///
/// Every path prefix (at `/` boundaries) becomes a directory node, with the
/// repository root represented by the sentinel path `.`. Directories are
/// processed deepest-first so that a parent is only hashed once every
/// currently-known child hash is available; a directory's hash is
/// `SHA-256(children's hashes, sorted by child path, joined with '|')`.
///
/// A directory with no hashed children at the time it is processed is
/// omitted from the output entirely — a known limitation carried over from
/// the original design (see design notes).
pub fn build_tree(file_hashes: &BTreeMap<String, String>) -> BTreeMap<String, TreeNode> {
    let mut nodes: BTreeMap<String, TreeNode> = BTreeMap::new();
    let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for path in file_hashes.keys() {
        nodes.insert(
            path.clone(),
            TreeNode { hash: file_hashes[path].clone(), is_directory: false },
        );
        register_ancestors(path, &mut children);
    }

    let mut dirs: Vec<String> = children.keys().cloned().collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(depth_of(d)));

    for dir in dirs {
        let mut child_paths = children.get(&dir).cloned().unwrap_or_default();
        child_paths.sort();

        let mut hashes = Vec::with_capacity(child_paths.len());
        for child in &child_paths {
            if let Some(node) = nodes.get(child) {
                hashes.push(node.hash.clone());
            }
        }
        if hashes.is_empty() {
            continue;
        }
        let joined = hashes.join("|");
        nodes.insert(dir, TreeNode { hash: hash_string(&joined), is_directory: true });
    }

    nodes
}

fn depth_of(dir: &str) -> usize {
    if dir == "." {
        return 0;
    }
    dir.matches('/').count() + 1
}

fn register_ancestors(path: &str, children: &mut BTreeMap<String, Vec<String>>) {
    let parts: Vec<&str> = path.split('/').collect();
    let mut current = String::from(".");
    for (i, part) in parts.iter().enumerate() {
        let child = if i == 0 { part.to_string() } else { format!("{current}/{part}") };
        children.entry(current.clone()).or_default().push(child.clone());
        current = child;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_produces_root_directory() {
        let mut files = BTreeMap::new();
        files.insert("a.py".to_string(), hash_string("hello"));
        let tree = build_tree(&files);

        assert!(tree.contains_key("a.py"));
        assert!(tree.contains_key("."));
        assert!(tree["."].is_directory);
        assert_eq!(tree["."].hash, hash_string(&tree["a.py"].hash));
    }

    #[test]
    fn nested_directories_hash_sorted_children() {
        let mut files = BTreeMap::new();
        files.insert("src/a.py".to_string(), hash_string("a"));
        files.insert("src/b.py".to_string(), hash_string("b"));
        let tree = build_tree(&files);

        let expected_src = hash_string(&format!("{}|{}", tree["src/a.py"].hash, tree["src/b.py"].hash));
        assert_eq!(tree["src"].hash, expected_src);
        assert_eq!(tree["."].hash, hash_string(&tree["src"].hash));
    }

    #[test]
    fn empty_input_produces_no_nodes() {
        let tree = build_tree(&BTreeMap::new());
        assert!(tree.is_empty());
    }

    #[test]
    fn identical_file_sets_produce_identical_root_hash() {
        let mut a = BTreeMap::new();
        a.insert("x/y.rs".to_string(), hash_string("content"));
        let mut b = BTreeMap::new();
        b.insert("x/y.rs".to_string(), hash_string("content"));

        assert_eq!(build_tree(&a)["."].hash, build_tree(&b)["."].hash);
    }
}
