//! Integration tests for `persdb log` and `persdb compare` against a freshly
//! initialized (empty) database directory.
#![allow(clippy::expect_used)]

use std::io::Write as _;
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

fn write_config(dir: &std::path::Path) -> PathBuf {
    let config_path = dir.join("db.hjson");
    let mut f = std::fs::File::create(&config_path).expect("create config");
    writeln!(
        f,
        "{{\n  name: testdb\n  chroot: {:?}\n  data: \"data\"\n}}",
        dir.display().to_string()
    )
    .expect("write config");
    config_path
}

#[test]
fn log_on_empty_db_exits_0_with_no_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());

    let out = Command::new(persdb_bin())
        .args(["log", config.to_str().expect("path")])
        .output()
        .expect("run persdb log");

    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(out.stdout.is_empty());
}

#[test]
fn compare_local_against_itself_on_empty_db_exits_0() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());

    let out = Command::new(persdb_bin())
        .args(["compare", config.to_str().expect("path"), "-a", "local"])
        .output()
        .expect("run persdb compare");

    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid json");
    assert_eq!(value["missing"], serde_json::json!(0));
    assert_eq!(value["equal"], serde_json::json!(0));
}

#[test]
fn compare_unknown_perspective_exits_1() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path());

    let out = Command::new(persdb_bin())
        .args(["compare", config.to_str().expect("path"), "-a", "nope"])
        .output()
        .expect("run persdb compare");

    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_config_file_exits_2() {
    let out = Command::new(persdb_bin())
        .args(["log", "/no/such/db.hjson"])
        .output()
        .expect("run persdb log");

    assert_eq!(out.status.code(), Some(2));
}
