// End-to-end tests driving the cmdrun binary against a temp database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdrun"))
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .arg("--db")
        .arg(dir.join("cli.db"))
        .args(args)
        .output()
        .unwrap()
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    serde_json::from_str(&run_ok(dir, args)).unwrap()
}

#[test]
fn test_create_list_feed_last() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    run_ok(dir, &["workspace", "create", "acme"]);
    run_ok(dir, &["user", "create", "alice"]);

    let created = run_json(
        dir,
        &[
            "command",
            "create",
            "--workspace",
            "acme",
            "--creator",
            "alice",
            "--payload",
            r#"{"command": "nmap -sV", "itime": 1717243200000, "duration": 120, "tool": "nmap"}"#,
        ],
    );
    assert_eq!(created["itime"], 1_717_243_200_000i64);
    assert_eq!(created["duration"], 120.0);
    assert_eq!(created["creator"], "alice");
    let id = created["_id"].as_i64().unwrap();

    let listed = run_json(dir, &["command", "list", "--workspace", "acme"]);
    assert_eq!(listed["commands"][0]["key"], id);

    let feed = run_json(dir, &["command", "feed", "--workspace", "acme"]);
    assert_eq!(feed[0]["date"], 1_717_243_200_000i64);
    assert_eq!(feed[0]["vulnerabilities_count"], 0);

    let last = run_json(dir, &["command", "last", "--workspace", "acme"]);
    assert_eq!(last["_id"], id);
}

#[test]
fn test_last_on_empty_workspace_prints_empty_object() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    run_ok(dir, &["workspace", "create", "empty"]);
    let last = run_json(dir, &["command", "last", "--workspace", "empty"]);
    assert_eq!(last, serde_json::json!({}));
}

#[test]
fn test_invalid_itime_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    run_ok(dir, &["workspace", "create", "acme"]);
    let output = run(
        dir,
        &[
            "command",
            "create",
            "--workspace",
            "acme",
            "--payload",
            r#"{"command": "ls", "itime": "noon"}"#,
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_INVALID_TIMESTAMP"));
}

#[test]
fn test_user_rename_requires_yes() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    run_ok(dir, &["user", "create", "alice"]);
    run_ok(dir, &["user", "create", "bob"]);

    let plan = run_ok(dir, &["user", "rename", "alice", "alicia"]);
    assert!(plan.contains("--yes"));

    let dry_missing = run(dir, &["user", "rename", "nobody", "carol"]);
    assert!(!dry_missing.status.success());
    assert!(String::from_utf8_lossy(&dry_missing.stderr).contains("ERR_NOT_FOUND"));

    let dry_taken = run(dir, &["user", "rename", "alice", "bob"]);
    assert!(!dry_taken.status.success());
    assert!(String::from_utf8_lossy(&dry_taken.stderr).contains("ERR_ALREADY_EXISTS"));

    run_ok(dir, &["user", "rename", "alice", "alicia", "--yes"]);

    let taken = run(dir, &["user", "rename", "alicia", "bob", "--yes"]);
    assert!(!taken.status.success());

    let missing = run(dir, &["user", "rename", "alice", "carol", "--yes"]);
    assert!(!missing.status.success());
    assert!(String::from_utf8_lossy(&missing.stderr).contains("ERR_NOT_FOUND"));
}

#[test]
fn test_trace_id_flag_tags_errors() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    let output = run(dir, &["--trace-id", "upstream-42", "user", "rename", "ghost", "casper"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERR_NOT_FOUND"));
    assert!(stderr.contains("trace_id: upstream-42"));
}
