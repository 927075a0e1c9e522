//! End-to-end tests for the sclbl binary.
//!
//! None of these reach the network: every case either stops before a
//! platform request or only touches the local credentials file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Stdio;
use tempfile::TempDir;

/// sclbl command against the local profile with its credentials in `creds`.
fn sclbl(creds: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sclbl").unwrap();
    cmd.env("SCLBL_PROFILE", "local")
        .env("SCLBL_CREDENTIALS", creds)
        .env_remove("SCLBL_STRICT_EXIT")
        .env_remove("SCLBL_DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_credentials(path: &Path) {
    fs::write(path, r#"{"username":"user@example.com","password":"secret"}"#).unwrap();
}

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("list-models"))
        .stdout(predicate::str::contains("list-assignments"))
        .stdout(predicate::str::contains("reset"));
}

#[test]
fn test_delete_without_ids_prints_usage_and_exits_zero() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .arg("delete")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Delete failed: please provide"));
}

#[test]
fn test_delete_without_ids_strict_exit() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .args(["delete", "--strict-exit"])
        .assert()
        .code(64);
}

#[test]
fn test_delete_quiet_prints_nothing() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .args(["delete", "-v", "false"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_reset_removes_stored_credentials() {
    let tmp = TempDir::new().unwrap();
    let creds = tmp.path().join("creds.json");
    write_credentials(&creds);

    sclbl(&creds)
        .arg("reset")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Your user details have been removed."));
    assert!(!creds.exists());
}

#[test]
fn test_reset_without_credentials_reports_failure_but_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let creds = tmp.path().join("creds.json");

    sclbl(&creds)
        .arg("reset")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Unable to remove your user details."));

    sclbl(&creds)
        .args(["--strict-exit", "reset"])
        .assert()
        .code(1);
}

#[test]
fn test_upload_of_missing_file_fails_gracefully() {
    let tmp = TempDir::new().unwrap();
    let creds = tmp.path().join("creds.json");
    let model = tmp.path().join("missing.onnx");

    sclbl(&creds)
        .args(["upload", "-n", "My model", "-f"])
        .arg(&model)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("We were unable to upload your model."));
}

#[test]
fn test_upload_requires_name() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .args(["upload", "-f", "model.onnx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}

#[test]
fn test_assign_with_empty_id_is_rejected_locally() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .args(["assign", "-c", "m1", "-d", "", "-r", "r1"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Assign failed: please provide"));
}

#[test]
fn test_unknown_profile_is_fatal() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .env("SCLBL_PROFILE", "staging")
        .arg("delete")
        .assert()
        .code(78)
        .stderr(predicate::str::contains("unknown profile 'staging'"));
}

#[test]
fn test_debug_env_raises_log_level() {
    let tmp = TempDir::new().unwrap();
    let creds = tmp.path().join("creds.json");

    sclbl(&creds)
        .arg("reset")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("initialising platform client").not());

    sclbl(&creds)
        .env("SCLBL_DEBUG", "1")
        .arg("reset")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("initialising platform client"));

    sclbl(&creds)
        .args(["reset", "--debug"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("initialising platform client"));
}

#[test]
fn test_rust_log_directives_are_honoured() {
    let tmp = TempDir::new().unwrap();
    sclbl(&tmp.path().join("creds.json"))
        .env("RUST_LOG", "sclbl=debug")
        .arg("delete")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("dispatching"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_unwritable_stdout_exits_with_software_error() {
    let full = Path::new("/dev/full");
    if !full.exists() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let sink = fs::OpenOptions::new().write(true).open(full).unwrap();
    let status = std::process::Command::new(assert_cmd::cargo::cargo_bin("sclbl"))
        .env("SCLBL_PROFILE", "local")
        .env("SCLBL_CREDENTIALS", tmp.path().join("creds.json"))
        .env_remove("SCLBL_STRICT_EXIT")
        .env_remove("SCLBL_DEBUG")
        .env_remove("RUST_LOG")
        .arg("delete")
        .stdout(Stdio::from(sink))
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(70));
}
