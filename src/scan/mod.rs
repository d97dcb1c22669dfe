//! File discovery and filtering (C2).
//!
//! Walks a repository root, applies the directory denylist and gitignore
//! rules, classifies binary/oversized/over-chunky files, and returns both
//! the files to ingest and the ones skipped along with a reason.

use crate::domain::RepoConfig;
use ignore::WalkBuilder;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

const DENYLIST: &[&str] =
    &["node_modules", "__pycache__", "venv", ".venv", "dist", "build", "target", ".git"];

const EXTENSIONLESS_TEXT_NAMES: &[&str] =
    &["makefile", "dockerfile", "jenkinsfile", "rakefile", "gemfile", "procfile", "vagrantfile"];

static TEXT_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // code
        ".py", ".pyi", ".pyx", ".pyw", ".rs", ".go", ".java", ".kt", ".kts", ".js", ".jsx", ".mjs",
        ".cjs", ".ts", ".tsx", ".c", ".h", ".cc", ".cpp", ".hpp", ".cs", ".rb", ".php", ".swift",
        ".scala", ".m", ".mm", ".lua", ".r", ".jl", ".ex", ".exs", ".erl", ".clj", ".hs", ".ml",
        ".fs", ".dart", ".sh", ".bash", ".zsh", ".ps1", ".sql", ".pl", ".pm",
        // config / data
        ".json", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".env", ".xml", ".properties",
        // web
        ".html", ".htm", ".css", ".scss", ".sass", ".less", ".vue", ".svelte",
        // docs
        ".md", ".rst", ".txt", ".adoc",
        // build
        ".gradle", ".cmake", ".mk",
    ]
    .into_iter()
    .collect()
});

const BINARY_MAGIC: &[&[u8]] = &[
    &[0x89, b'P', b'N', b'G'],
    &[0xFF, 0xD8, 0xFF],              // JPEG
    &[b'G', b'I', b'F', b'8'],        // GIF
    &[b'P', b'K', 0x03, 0x04],        // ZIP family (also jar/docx/etc)
    &[0x7F, b'E', b'L', b'F'],        // ELF
    &[0xCA, 0xFE, 0xBA, 0xBE],        // Mach-O fat binary / Java class
    &[0xFE, 0xED, 0xFA, 0xCE],        // Mach-O 32
    &[0xFE, 0xED, 0xFA, 0xCF],        // Mach-O 64
    &[0x00, 0x00, 0x01, 0x00],        // ICO
    &[b'%', b'P', b'D', b'F'],        // PDF
    &[0x1F, 0x8B],                    // gzip
    &[b'B', b'Z', b'h'],              // bzip2
    &[0xFD, b'7', b'z', b'X', b'Z'],  // xz
    &[b'R', b'a', b'r', b'!'],        // RAR
    &[0x00, b'a', b's', b'm'],        // WASM
];

#[derive(Debug, Clone)]
pub struct WalkResult {
    pub files: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

pub struct Walker {
    root: PathBuf,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn walk(&self, cfg: &RepoConfig) -> WalkResult {
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .git_ignore(true)
            .git_global(false)
            .git_exclude(false)
            .hidden(false)
            .parents(false)
            .filter_entry(|entry| {
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    let name = entry.file_name().to_string_lossy();
                    if name.starts_with('.') || DENYLIST.contains(&name.as_ref()) {
                        return false;
                    }
                }
                true
            });

        for entry in builder.build().flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }

            let file_name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            if file_name.starts_with('.') {
                continue;
            }

            let rel = match path.strip_prefix(&self.root) {
                Ok(p) => crate::utils::paths::normalize_path(&p.to_string_lossy()),
                Err(_) => continue,
            };

            if is_binary(path) {
                skipped.push((rel, "binary file".to_string()));
                continue;
            }

            let size = match path.metadata() {
                Ok(m) => m.len(),
                Err(_) => {
                    skipped.push((rel, "unreadable".to_string()));
                    continue;
                }
            };

            if size > cfg.max_file_size_bytes {
                skipped.push((rel, format!("file size {size} exceeds max_file_size_bytes")));
                continue;
            }

            let estimated_chunks =
                estimate_chunks(size, cfg.token_target).max(1);
            if estimated_chunks > cfg.chunk_threshold {
                skipped.push((
                    rel,
                    format!(
                        "estimated chunks {estimated_chunks} > threshold {}",
                        cfg.chunk_threshold
                    ),
                ));
                continue;
            }

            files.push(rel);
        }

        files.sort();
        WalkResult { files, skipped }
    }
}

fn estimate_chunks(size_bytes: u64, token_target: usize) -> usize {
    let denom = (token_target as u64).saturating_mul(4).max(1);
    ((size_bytes / denom) as usize).max(1)
}

fn is_binary(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_ascii_lowercase();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()));

    let known_text = match &ext {
        Some(e) => TEXT_EXTENSIONS.contains(e.as_str()),
        None => EXTENSIONLESS_TEXT_NAMES.contains(&name.as_str()),
    };
    if known_text {
        return false;
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return true,
    };
    let mut buf = [0u8; 16];
    let n = match file.read(&mut buf) {
        Ok(n) => n,
        Err(_) => return true,
    };
    if n == 0 {
        return false;
    }
    let sample = &buf[..n];
    if BINARY_MAGIC.iter().any(|magic| sample.starts_with(magic)) {
        return true;
    }
    sample.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn walks_text_files_and_skips_binary() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.py"), "def foo():\n    pass\n").unwrap();
        fs::write(root.join("logo.png"), [0x89u8, b'P', b'N', b'G', 0, 0, 0]).unwrap();

        let walker = Walker::new(root);
        let result = walker.walk(&RepoConfig::default());

        assert_eq!(result.files, vec!["a.py".to_string()]);
        assert!(result.skipped.iter().any(|(p, _)| p == "logo.png"));
    }

    #[test]
    fn skips_denylisted_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/lib.js"), "module.exports = {}").unwrap();
        fs::write(root.join("main.js"), "console.log(1)").unwrap();

        let result = Walker::new(root).walk(&RepoConfig::default());
        assert_eq!(result.files, vec!["main.js".to_string()]);
    }

    #[test]
    fn respects_gitignore() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join(".gitignore"), "ignored.py\n").unwrap();
        fs::write(root.join("ignored.py"), "x = 1\n").unwrap();
        fs::write(root.join("kept.py"), "y = 2\n").unwrap();

        let result = Walker::new(root).walk(&RepoConfig::default());
        assert_eq!(result.files, vec!["kept.py".to_string()]);
    }

    #[test]
    fn skips_files_over_chunk_threshold() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("big.py"), "x = 1\n".repeat(20_000)).unwrap();

        let cfg = RepoConfig { chunk_threshold: 1, ..RepoConfig::default() };
        let result = Walker::new(root).walk(&cfg);

        assert!(result.files.is_empty());
        assert!(result.skipped.iter().any(|(p, reason)| p == "big.py" && reason.contains("threshold")));
    }

    #[test]
    fn skips_files_over_size_cap() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("huge.py"), vec![b'a'; 2048]).unwrap();

        let cfg = RepoConfig { max_file_size_bytes: 1024, ..RepoConfig::default() };
        let result = Walker::new(root).walk(&cfg);

        assert!(result.files.is_empty());
        assert!(result.skipped.iter().any(|(p, _)| p == "huge.py"));
    }
}
