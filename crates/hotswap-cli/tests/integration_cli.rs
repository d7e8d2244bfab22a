//! Integration tests for the `hotswap` binary's argument handling.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hotswap() -> Command {
    Command::cargo_bin("hotswap").unwrap()
}

#[test]
fn test_help_lists_dev() {
    hotswap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("dev"));
}

#[test]
fn test_dev_help_lists_flags() {
    hotswap()
        .args(["dev", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--debounce"))
        .stdout(predicate::str::contains("--reloaddirs"))
        .stdout(predicate::str::contains("--frontend-devserver-url"));
}

#[test]
fn test_zero_debounce_is_rejected() {
    hotswap()
        .args(["dev", "--debounce", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("debounce"));
}

#[test]
fn test_missing_project_dir_fails() {
    let temp = TempDir::new().unwrap();
    hotswap()
        .args(["--no-color", "dev", "--project-dir"])
        .arg(temp.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_auto_discovery_without_watcher_fails() {
    let temp = TempDir::new().unwrap();
    hotswap()
        .current_dir(temp.path())
        .args([
            "--no-color",
            "dev",
            "--no-sync-deps",
            "--skip-frontend",
            "--frontend-devserver-url",
            "auto",
        ])
        .arg("--project-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("frontend:dev:watcher"));
}

#[test]
fn test_colored_output_starts_cleanly() {
    let temp = TempDir::new().unwrap();
    hotswap()
        .current_dir(temp.path())
        .env_remove("NO_COLOR")
        .env("FORCE_COLOR", "1")
        .args([
            "dev",
            "--no-sync-deps",
            "--skip-frontend",
            "--frontend-devserver-url",
            "auto",
        ])
        .arg("--project-dir")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("frontend:dev:watcher"))
        .stderr(predicate::str::contains("panicked").not());
}
