//! Integration tests for `persdb timestamp`.
#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::process::Command;

fn persdb_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("persdb");
    path
}

#[test]
fn ten_digit_seconds_exits_0() {
    let out = Command::new(persdb_bin())
        .args(["timestamp", "1700000000"])
        .output()
        .expect("run persdb timestamp");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert_eq!(value["millis"], serde_json::json!(1_700_000_000_000i64));
}

#[test]
fn thirteen_digit_millis_pass_through() {
    let out = Command::new(persdb_bin())
        .args(["timestamp", "1700000000123"])
        .output()
        .expect("run persdb timestamp");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert_eq!(value["millis"], serde_json::json!(1_700_000_000_123i64));
}

#[test]
fn garbage_input_exits_1() {
    let out = Command::new(persdb_bin())
        .args(["timestamp", "not-a-timestamp"])
        .output()
        .expect("run persdb timestamp");
    assert_eq!(out.status.code(), Some(1));
}
