//! Integration tests for the CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Builds a `repo-indexer` command with XDG dirs pinned to an isolated temp
/// directory so tests never touch the real user config/data.
fn cmd(xdg: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repo-indexer").unwrap();
    cmd.env("XDG_CONFIG_HOME", xdg.path().join("config"));
    cmd.env("XDG_DATA_HOME", xdg.path().join("data"));
    cmd
}

#[test]
fn test_cli_version() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg).arg("--version").assert().success().stdout(predicate::str::contains("repo-indexer"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("repos"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn test_init_creates_config_file() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg).arg("init").assert().success();

    let config_path = xdg.path().join("config").join("repo-indexer").join("config.json");
    assert!(config_path.exists());
}

#[test]
fn test_config_prints_resolved_paths() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("token_target"));
}

#[test]
fn test_repos_reports_empty_when_nothing_ingested() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg)
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::contains("no repositories indexed yet"));
}

#[test]
fn test_ingest_then_repos_then_status_roundtrip() {
    let xdg = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("main.py"), "def greet():\n    return 'hi'\n").unwrap();

    cmd(&xdg)
        .args(["ingest", repo.path().to_str().unwrap(), "--name", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added"));

    cmd(&xdg).arg("repos").assert().success().stdout(predicate::str::contains("demo"));

    cmd(&xdg)
        .args(["status", "--repo", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_ingest_is_incremental_on_second_run() {
    let xdg = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("a.py"), "def a():\n    pass\n").unwrap();

    cmd(&xdg).args(["ingest", repo.path().to_str().unwrap(), "--name", "demo"]).assert().success();

    fs::write(repo.path().join("b.py"), "def b():\n    pass\n").unwrap();
    cmd(&xdg)
        .args(["ingest", repo.path().to_str().unwrap(), "--name", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 added").and(predicate::str::contains("0 modified")));
}

#[test]
fn test_purge_removes_repository() {
    let xdg = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("a.py"), "def a():\n    pass\n").unwrap();

    cmd(&xdg).args(["ingest", repo.path().to_str().unwrap(), "--name", "demo"]).assert().success();

    cmd(&xdg)
        .args(["purge", "demo", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged"));

    cmd(&xdg)
        .arg("repos")
        .assert()
        .success()
        .stdout(predicate::str::contains("no repositories indexed yet"));
}

#[test]
fn test_purge_unknown_repo_reports_not_found() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg)
        .args(["purge", "ghost", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_status_unknown_repo_reports_not_found() {
    let xdg = TempDir::new().unwrap();
    cmd(&xdg)
        .args(["status", "--repo", "ghost"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_ingest_file_force_indexes_single_file() {
    let xdg = TempDir::new().unwrap();
    let repo = TempDir::new().unwrap();
    let file = repo.path().join("isolated.py");
    fs::write(&file, "def lonely():\n    pass\n").unwrap();

    cmd(&xdg).args(["ingest", repo.path().to_str().unwrap(), "--name", "demo"]).assert().success();

    cmd(&xdg)
        .args(["ingest-file", file.to_str().unwrap(), "--repo", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 files processed"));
}
