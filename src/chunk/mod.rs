//! Language-heuristic chunker family (C3).
//!
//! Every chunker implements the same contract: split a file's text into an
//! ordered, non-overlapping-by-default series of [`Chunk`]s with dense
//! `chunk_index`, monotonic `start_line`, and (where recognisable) a
//! `symbol_name`/`symbol_type`. The dispatcher picks a strategy by file
//! extension, then overwrites `language` and recomputes `chunk_hash` so the
//! hash always reflects the final file path and position, not whatever the
//! per-language chunker produced internally.

mod generic;
mod go;
mod java;
mod python;
mod typescript;

use crate::domain::Chunk;
use crate::utils::estimate_tokens;
use sha2::{Digest, Sha256};

pub const DEFAULT_TOKEN_TARGET: usize = 500;
pub const DEFAULT_OVERLAP_TOKENS: usize = 64;

/// Split `content` from `file_path` into chunks, dispatching on extension.
///
/// This is the only entry point external callers should use: it applies the
/// per-language heuristic, then stamps `language` and `chunk_hash` uniformly
/// so identical logic never needs repeating in each chunker.
pub fn chunk_file(
    file_path: &str,
    content: &str,
    token_target: usize,
    overlap_tokens: usize,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let language = language_for_path(file_path);
    let mut chunks = match language {
        Some("typescript") | Some("javascript") => {
            typescript::chunk(content, token_target, overlap_tokens)
        }
        Some("python") => python::chunk(content, token_target, overlap_tokens),
        Some("java") | Some("kotlin") => java::chunk(content, token_target, overlap_tokens),
        Some("go") => go::chunk(content, token_target, overlap_tokens),
        _ => generic::chunk(content, token_target, overlap_tokens),
    };

    for (idx, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = idx;
        chunk.language = language.map(str::to_string);
        chunk.chunk_hash = chunk_hash(file_path, idx, &chunk.content);
    }
    chunks
}

fn chunk_hash(file_path: &str, chunk_index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk_index.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn language_for_path(file_path: &str) -> Option<&'static str> {
    let ext = file_path.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "ts" | "tsx" | "mts" | "cts" => Some("typescript"),
        "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
        "py" | "pyi" | "pyx" | "pyw" => Some("python"),
        "java" => Some("java"),
        "kt" | "kts" => Some("kotlin"),
        "go" => Some("go"),
        _ => None,
    }
}

/// Shared overlap computation used by the generic and TypeScript chunkers:
/// walk `lines` from the end, collecting trailing lines until adding one
/// more would exceed `overlap_tokens`. Stops *before* exceeding the budget.
pub(crate) fn trailing_overlap(lines: &[String], overlap_tokens: usize) -> Vec<String> {
    let mut collected = Vec::new();
    let mut total = 0usize;
    for line in lines.iter().rev() {
        let lt = estimate_tokens(line).max(1);
        if total + lt > overlap_tokens && !collected.is_empty() {
            break;
        }
        collected.push(line.clone());
        total += lt;
        if total >= overlap_tokens {
            break;
        }
    }
    collected.reverse();
    collected
}

pub(crate) fn new_chunk(content: String, start_line: usize, end_line: usize) -> Chunk {
    Chunk {
        content,
        start_line,
        end_line,
        chunk_index: 0,
        chunk_hash: String::new(),
        language: None,
        symbol_name: None,
        symbol_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_hash_is_stable_for_same_inputs() {
        let a = chunk_hash("a.py", 0, "x = 1");
        let b = chunk_hash("a.py", 0, "x = 1");
        assert_eq!(a, b);
    }

    #[test]
    fn chunk_hash_differs_by_path() {
        let a = chunk_hash("a.py", 0, "x = 1");
        let b = chunk_hash("b.py", 0, "x = 1");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_file("a.py", "   \n\n", 500, 64).is_empty());
    }

    #[test]
    fn chunk_indices_are_dense_and_start_lines_monotonic() {
        let content = "def a():\n    pass\n\n\ndef b():\n    pass\n".repeat(50);
        let chunks = chunk_file("a.py", &content, 50, 8);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
        }
        for w in chunks.windows(2) {
            assert!(w[0].start_line <= w[1].start_line);
        }
    }
}
