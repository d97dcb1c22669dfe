//! JSON settings file: data directory, global defaults, and per-repository
//! overrides keyed by absolute repository path (§6).

use crate::domain::{RepoConfig, RepoConfigPatch, Settings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default)]
struct DefaultsFile {
    token_target: Option<usize>,
    overlap_tokens: Option<usize>,
    chunk_threshold: Option<usize>,
    max_file_size_bytes: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct SettingsFile {
    data_dir: Option<PathBuf>,
    #[serde(default)]
    defaults: DefaultsFile,
    #[serde(default)]
    repos: BTreeMap<String, DefaultsFile>,
}

/// `~/.config/<app>/config.json`-equivalent path for this crate's settings.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("repo-indexer")
        .join("config.json")
}

/// `~/.local/share/<app>`-equivalent base data directory for the metadata
/// database and the reference vector store.
pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("repo-indexer")
}

pub fn load_settings() -> Settings {
    load_settings_from(&config_path())
}

fn load_settings_from(path: &Path) -> Settings {
    let default_settings = Settings {
        data_dir: data_dir(),
        defaults: RepoConfig::default(),
        repo_overrides: BTreeMap::new(),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return default_settings,
    };

    let parsed: SettingsFile = match serde_json::from_str(&content) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!("failed to parse config at {}: {e}", path.display());
            return default_settings;
        }
    };

    let mut defaults = RepoConfig::default();
    if let Some(v) = parsed.defaults.token_target {
        defaults.token_target = v;
    }
    if let Some(v) = parsed.defaults.overlap_tokens {
        defaults.overlap_tokens = v;
    }
    if let Some(v) = parsed.defaults.chunk_threshold {
        defaults.chunk_threshold = v;
    }
    if let Some(v) = parsed.defaults.max_file_size_bytes {
        defaults.max_file_size_bytes = v;
    }

    let repo_overrides = parsed
        .repos
        .into_iter()
        .map(|(path, patch)| {
            (
                path,
                RepoConfigPatch {
                    token_target: patch.token_target,
                    overlap_tokens: patch.overlap_tokens,
                    chunk_threshold: patch.chunk_threshold,
                    max_file_size_bytes: patch.max_file_size_bytes,
                },
            )
        })
        .collect();

    Settings {
        data_dir: parsed.data_dir.unwrap_or_else(data_dir),
        defaults,
        repo_overrides,
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let file = SettingsFile {
        data_dir: Some(settings.data_dir.clone()),
        defaults: DefaultsFile {
            token_target: Some(settings.defaults.token_target),
            overlap_tokens: Some(settings.defaults.overlap_tokens),
            chunk_threshold: Some(settings.defaults.chunk_threshold),
            max_file_size_bytes: Some(settings.defaults.max_file_size_bytes),
        },
        repos: settings
            .repo_overrides
            .iter()
            .map(|(path, patch)| {
                (
                    path.clone(),
                    DefaultsFile {
                        token_target: patch.token_target,
                        overlap_tokens: patch.overlap_tokens,
                        chunk_threshold: patch.chunk_threshold,
                        max_file_size_bytes: patch.max_file_size_bytes,
                    },
                )
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&file).context("serializing settings")?;
    std::fs::write(&path, json).with_context(|| format!("writing config to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_settings_from(&tmp.path().join("missing.json"));
        assert_eq!(settings.defaults.token_target, 500);
    }

    #[test]
    fn malformed_file_soft_fails_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not valid json").unwrap();
        let settings = load_settings_from(&path);
        assert_eq!(settings.defaults.chunk_threshold, 200);
    }

    #[test]
    fn per_repo_override_merges_over_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"defaults": {"token_target": 500}, "repos": {"/repo/a": {"token_target": 50}}}"#,
        )
        .unwrap();
        let settings = load_settings_from(&path);
        let cfg = settings.get_repo_config("/repo/a");
        assert_eq!(cfg.token_target, 50);
        assert_eq!(cfg.overlap_tokens, 64);
    }
}
