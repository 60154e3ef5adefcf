//! End-to-end tests for the grouptree binary
//!
//! Each test runs the built binary with a clean environment and checks what
//! it prints on stdout; logs go to stderr.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn grouptree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grouptree"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("GROUPTREE_LOG_LEVEL", "warn")
        .output()
        .expect("failed to run grouptree")
}

fn write_layout(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("layout.toml");
    fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_tree_prints_json_snapshot() {
    let dir = TempDir::new().unwrap();
    let layout = write_layout(&dir, "[[group]]\nname = \"g1\"\n\n[[group.group]]\nname = \"g1a\"\n");

    let output = grouptree(&["tree", "--layout", &layout]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json, serde_json::json!({"g1": {".": {"user_len": 0}, "g1a": {".": {"user_len": 0}}}}));
}

#[test]
fn test_tree_text_format() {
    let dir = TempDir::new().unwrap();
    let layout = write_layout(
        &dir,
        "[[group]]\nname = \"g1\"\n\n[[group.group]]\nname = \"g1a\"\n\n[[group]]\nname = \"g2\"\n",
    );

    let output = grouptree(&["tree", "--layout", &layout, "--format", "text"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "|─ g1\n|   └─ g1a\n└─ g2\n");
}

#[test]
fn test_tree_with_missing_layout_fails() {
    let output = grouptree(&["tree", "--layout", "/nonexistent/layout.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read layout"));
}

#[test]
fn test_churn_reports_consistent_counts() {
    let output = grouptree(&["churn", "--threads", "3", "--ops", "300", "--seed", "9"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let attached: u64 = report["list_lengths"]
        .as_array()
        .unwrap()
        .iter()
        .map(|len| len.as_u64().unwrap())
        .sum();
    let appends = report["appends"].as_u64().unwrap();
    let pops = report["pops"].as_u64().unwrap();
    assert_eq!(appends - pops, attached);
}

#[test]
fn test_config_written_and_reloaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grouptree.toml");
    let path_str = path.to_string_lossy().into_owned();

    let output = grouptree(&["config", "--output", &path_str]);
    assert!(output.status.success());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("[hierarchy]"));
    assert!(written.contains("max_depth = 32"));

    // The written file is accepted as input
    let output = grouptree(&["--config", &path_str, "config"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("contention_warn_after = \"50ms\""));
}

#[test]
fn test_churn_writes_prometheus_metrics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.prom");
    let path_str = path.to_string_lossy().into_owned();

    let output = grouptree(&["--metrics-out", &path_str, "churn", "--threads", "2", "--ops", "100"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let rendered = fs::read_to_string(&path).unwrap();
    assert!(rendered.contains("hierarchy_append_total"), "metrics: {}", rendered);
    assert!(rendered.contains("hierarchy_nodes_live"));
}

#[test]
fn test_disabled_metrics_write_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.prom");
    let path_str = path.to_string_lossy().into_owned();

    let output = Command::new(env!("CARGO_BIN_EXE_grouptree"))
        .args(["--metrics-out", &path_str, "churn", "--threads", "1", "--ops", "10"])
        .env_remove("RUST_LOG")
        .env("GROUPTREE_LOG_LEVEL", "warn")
        .env("GROUPTREE_METRICS_ENABLED", "false")
        .output()
        .expect("failed to run grouptree");
    assert!(output.status.success());
    assert!(!path.exists());
}
