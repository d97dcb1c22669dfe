//! Changeset computation (C4): a straightforward set-diff between stored
//! file-hash leaves and the current filesystem state. Directory Merkle
//! hashes are intentionally not consulted here (§9 — future short-circuit
//! work), so every ingest walks and hashes every surviving file.

use crate::domain::Changeset;
use std::collections::BTreeMap;

pub fn compute_changeset(
    stored: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Changeset {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut deleted = Vec::new();

    for (path, hash) in current {
        match stored.get(path) {
            None => added.push(path.clone()),
            Some(stored_hash) if stored_hash != hash => modified.push(path.clone()),
            Some(_) => {}
        }
    }
    for path in stored.keys() {
        if !current.contains_key(path) {
            deleted.push(path.clone());
        }
    }

    added.sort();
    modified.sort();
    deleted.sort();
    Changeset { added, modified, deleted }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn detects_added_modified_and_deleted() {
        let stored = map(&[("a.py", "h1"), ("b.py", "h2"), ("c.py", "h3")]);
        let current = map(&[("a.py", "h1"), ("b.py", "h2changed"), ("d.py", "h4")]);

        let cs = compute_changeset(&stored, &current);
        assert_eq!(cs.added, vec!["d.py".to_string()]);
        assert_eq!(cs.modified, vec!["b.py".to_string()]);
        assert_eq!(cs.deleted, vec!["c.py".to_string()]);
    }

    #[test]
    fn no_changes_when_identical() {
        let stored = map(&[("a.py", "h1")]);
        let current = map(&[("a.py", "h1")]);
        let cs = compute_changeset(&stored, &current);
        assert!(!cs.has_changes());
    }

    #[test]
    fn lists_are_pairwise_disjoint_and_sorted() {
        let stored = map(&[("z.py", "h1"), ("m.py", "h2")]);
        let current = map(&[("a.py", "h3"), ("m.py", "h2changed")]);
        let cs = compute_changeset(&stored, &current);
        assert_eq!(cs.added, vec!["a.py".to_string()]);
        assert_eq!(cs.modified, vec!["m.py".to_string()]);
        assert_eq!(cs.deleted, vec!["z.py".to_string()]);

        let mut all: Vec<&String> = cs.added.iter().chain(&cs.modified).chain(&cs.deleted).collect();
        let before = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), before);
    }
}
