//! Integration tests for the CLI
//!
//! Tests the command-line interface for the apply and check commands

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn anchor_patcher(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_anchor-patcher"))
        .arg("--no-color")
        .args(args)
        .output()
        .unwrap()
}

/// Helper to create a test workspace with a target and a plans directory
fn setup_test_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(dir.path().join("doc.txt"), "A\nB\nC").unwrap();

    let plans_dir = dir.path().join("plans");
    fs::create_dir(&plans_dir).unwrap();
    fs::write(
        plans_dir.join("01-expand.toml"),
        r#"[meta]
name = "expand"
file = "../doc.txt"

[[operations]]
type = "replace"
needle = "B"
replacement = "X\nY"

[[operations]]
type = "insert-before"
anchor = "C"
insertion = "Z\n"
"#,
    )
    .unwrap();

    dir
}

fn plan_arg(dir: &TempDir) -> String {
    dir.path()
        .join("plans/01-expand.toml")
        .to_string_lossy()
        .into_owned()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_apply_help() {
    let output = anchor_patcher(&["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--dry-run"));
    assert!(stdout.contains("--best-effort"));
    assert!(stdout.contains("--diff"));
}

#[test]
fn test_apply_writes_target() {
    let dir = setup_test_workspace();

    let output = anchor_patcher(&["apply", &plan_arg(&dir)]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("expand: Updated"));
    assert!(stdout.contains("1 written"));
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nX\nY\nZ\nC");
}

#[test]
fn test_apply_directory_of_plans() {
    let dir = setup_test_workspace();
    let plans_dir = dir.path().join("plans");

    let output = anchor_patcher(&["apply", &plans_dir.to_string_lossy()]);

    assert!(output.status.success());
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nX\nY\nZ\nC");
}

#[test]
fn test_dry_run_with_diff_leaves_file() {
    let dir = setup_test_workspace();

    let output = anchor_patcher(&["apply", "--dry-run", "--diff", &plan_arg(&dir)]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("Would update"));
    assert!(stdout.contains("-B"));
    assert!(stdout.contains("+X"));
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nB\nC");
}

#[test]
fn test_missing_literal_fails_and_writes_nothing() {
    let dir = setup_test_workspace();
    fs::write(dir.path().join("doc.txt"), "A\nB\nD").unwrap();

    let output = anchor_patcher(&["apply", &plan_arg(&dir)]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MISSING"));
    assert!(stderr.contains("insert-before"));
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nB\nD");
}

#[test]
fn test_best_effort_writes_partial_but_exits_nonzero() {
    let dir = setup_test_workspace();
    fs::write(dir.path().join("doc.txt"), "A\nB\nD").unwrap();

    let output = anchor_patcher(&["apply", "--best-effort", &plan_arg(&dir)]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1 incomplete"));
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nX\nY\nD");
}

#[test]
fn test_target_override() {
    let dir = setup_test_workspace();
    let other = dir.path().join("other.txt");
    fs::write(&other, "B then C").unwrap();

    let output = anchor_patcher(&[
        "apply",
        "--target",
        &other.to_string_lossy(),
        &plan_arg(&dir),
    ]);

    assert!(output.status.success());
    assert_eq!(read(&other), "X\nY then Z\nC");
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nB\nC");
}

#[test]
fn test_check_json_report() {
    let dir = setup_test_workspace();

    let output = anchor_patcher(&["check", "--json", &plan_arg(&dir)]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &report[0];
    assert_eq!(first["name"], "expand");
    assert_eq!(first["report"]["status"], "would-write");
    assert_eq!(first["report"]["operations"].as_array().unwrap().len(), 2);
    assert_eq!(read(&dir.path().join("doc.txt")), "A\nB\nC");
}

#[test]
fn test_check_missing_target_exits_nonzero() {
    let dir = setup_test_workspace();
    fs::remove_file(dir.path().join("doc.txt")).unwrap();

    let output = anchor_patcher(&["check", "--json", &plan_arg(&dir)]);

    assert!(!output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report[0]["error"]
        .as_str()
        .unwrap()
        .contains("cannot read source"));
}

#[test]
fn test_invalid_plan_is_reported() {
    let dir = setup_test_workspace();
    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[meta]\nfile = \"doc.txt\"\n").unwrap();

    let output = anchor_patcher(&["apply", &bad.to_string_lossy()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("plan contains no operations"));
}
