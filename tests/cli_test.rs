// tests/cli_test.rs
mod common;

use common::TestRepo;
use std::process::{Command, Output};

fn nextver(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nextver"))
        .args(args)
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute nextver")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn sample() -> TestRepo {
    let mut repo = TestRepo::new();
    repo.commit("Initial commit");
    repo.tag("v1.0.0");
    repo.commit("feat(cli): add releases command");
    repo.tag("v1.1.0");
    repo.commit("fix: wrong column width");
    repo
}

#[test]
fn test_help() {
    let output = nextver(&["--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("nextver"));
    assert!(stdout.contains("changelog"));
    assert!(stdout.contains("releases"));
}

#[test]
fn test_next_version() {
    let repo = sample();
    let output = nextver(&["-r", repo.path_str()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "v1.1.1\n");

    let output = nextver(&["next", "-r", repo.path_str(), "-o", "json"]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["next_version"], "v1.1.1");
}

#[test]
fn test_changelog_json() {
    let repo = sample();
    let output = nextver(&["changelog", "-r", repo.path_str(), "-o", "json", "--release", "v1.1.0"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["current_version"], "v1.1.0");
    assert_eq!(value["next_version"], "v1.2.0");
    assert_eq!(value["version_pattern"], "vSEMVER");
    assert_eq!(value["changelog"].as_array().unwrap().len(), 1);
    assert_eq!(value["changelog"][0]["scope"], "cli");
    assert_eq!(value["changelog"][0]["level"], "MINOR");
}

#[test]
fn test_changelog_console() {
    let repo = sample();
    let output = nextver(&["changelog", "-r", repo.path_str(), "--no-color"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    assert!(stdout.contains("Current release version\t: v1.1.0"));
    assert!(stdout.contains("Next release version\t: v1.1.1"));
    assert!(stdout.contains(" fix  | PATCH |       | wrong column width"));
}

#[test]
fn test_releases_yaml() {
    let repo = sample();
    let output = nextver(&["releases", "-r", repo.path_str(), "-o", "yaml", "--sort-by-version"]);
    assert!(output.status.success());

    let stdout = stdout(&output);
    let first = stdout.find("current_version: v1.1.0").unwrap();
    let second = stdout.find("current_version: v1.0.0").unwrap();
    assert!(first < second);
    assert!(!stdout.contains("next_version"));
}

#[test]
fn test_unknown_release_fails() {
    let repo = sample();
    let output = nextver(&["changelog", "-r", repo.path_str(), "--release", "v7.0.0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("v7.0.0"));
}

#[test]
fn test_github_without_token_fails() {
    let home = tempfile::TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_nextver"))
        .args(["-r", "github.com/owner/repo"])
        .env_remove("GITHUB_TOKEN")
        .env("HOME", home.path())
        .output()
        .expect("Failed to execute nextver");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("token"));
}

#[test]
fn test_missing_repository_fails() {
    let output = nextver(&["-r", "/no/such/repository"]);
    assert_eq!(output.status.code(), Some(1));
}
