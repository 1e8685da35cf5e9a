//! End-to-end tests for the `push` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn push(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("push").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("config.toml"))
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .env_remove("RUST_LOG")
        .env_remove("PUSH_LOG");
    cmd
}

fn write_config(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

#[test]
fn help_lists_commands() {
    let dir = tempdir().unwrap();
    push(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("mark-read"));
}

#[test]
fn send_without_credentials_fails() {
    let dir = tempdir().unwrap();
    push(&dir)
        .args(["send", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("app token not configured"));
}

#[test]
fn send_without_user_key_fails() {
    let dir = tempdir().unwrap();
    write_config(&dir.path().join("config.toml"), "app_token = \"tok\"\n");
    push(&dir)
        .args(["send", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user key not configured"));
}

#[test]
fn send_rejects_out_of_range_priority() {
    let dir = tempdir().unwrap();
    push(&dir)
        .args(["send", "-p", "3", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("3"));
}

#[test]
fn messages_requires_login() {
    let dir = tempdir().unwrap();
    write_config(
        &dir.path().join("config.toml"),
        "app_token = \"tok\"\nuser_key = \"usr\"\n",
    );
    push(&dir)
        .arg("messages")
        .assert()
        .failure()
        .stderr(predicate::str::contains("push login"));
}

#[test]
fn messages_accepts_non_positive_limit() {
    let dir = tempdir().unwrap();
    write_config(
        &dir.path().join("config.toml"),
        "app_token = \"tok\"\nuser_key = \"usr\"\n",
    );
    for limit in ["0", "-1"] {
        push(&dir)
            .args(["messages", "-n", limit])
            .assert()
            .failure()
            .stderr(predicate::str::contains("push login"));
    }
}

#[test]
fn history_on_empty_database() {
    let dir = tempdir().unwrap();
    push(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No messages."));
    assert!(dir.path().join("data").join("push.db").exists());
}

#[test]
fn sent_history_as_json() {
    let dir = tempdir().unwrap();
    push(&dir)
        .args(["history", "--sent", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn history_rejects_bad_since() {
    let dir = tempdir().unwrap();
    push(&dir)
        .args(["history", "--since", "someday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--since"));
}

#[test]
fn mark_read_zero_fails() {
    let dir = tempdir().unwrap();
    push(&dir)
        .args(["mark-read", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be positive"));
}

#[test]
fn config_shows_unset_values() {
    let dir = tempdir().unwrap();
    push(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("App token:        (not set)"));
}

#[test]
fn logout_keeps_app_credentials() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    write_config(
        &path,
        "app_token = \"tok\"\nuser_key = \"usr\"\ndevice_id = \"d\"\ndevice_secret = \"s\"\n",
    );
    push(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.contains("app_token = \"tok\""));
    assert!(saved.contains("device_secret = \"\""));
}
