//! CLI integration tests for oxide-dialect-fs.
//!
//! These tests run the binary against on-disk fixture trees and check its
//! output and exit codes.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::disk_tree;

/// Get a command for the oxide-dialect-fs binary, isolated from the
/// caller's database configuration.
fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("oxide-dialect-fs").unwrap();
    cmd.env_remove("DATABASE_URL");
    cmd
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("aliases"));
}

#[test]
fn test_validate_subcommand_help() {
    cmd()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--target"))
        .stdout(predicate::str::contains("--warn-only"))
        .stdout(predicate::str::contains("--validate-default"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("oxide-dialect-fs"));
}

// =============================================================================
// Resolve Tests
// =============================================================================

#[test]
fn test_resolve_lists_layers_in_order() {
    let dir = disk_tree(&[
        ("common/0.up.sql", ""),
        ("1.up.sql", ""),
        ("postgres/2.up.sql", ""),
        ("sqlite/2.up.sql", ""),
    ]);
    cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["resolve", "--dialect", "sqlite3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dialect: sqlite"))
        .stdout(predicate::str::contains("[common] common/0.up.sql"))
        .stdout(predicate::str::contains("[root] root/1.up.sql"))
        .stdout(predicate::str::contains("[dialect-specific] sqlite/2.up.sql"))
        .stdout(predicate::str::contains("postgres/2.up.sql").not());
}

#[test]
fn test_resolve_json_output() {
    let dir = disk_tree(&[("pg/1.up.sql", "")]);
    let output = cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["--format", "json", "resolve"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dialect"], "postgres");
    assert_eq!(report["files"][0]["dir"], "pg");
    assert_eq!(report["files"][0]["layer"], "dialect");
    assert_eq!(report["diagnostics"].as_array().unwrap().len(), 3);
}

#[test]
fn test_resolve_uses_default_dialect_flag() {
    let dir = disk_tree(&[("sqlite/1.up.sql", "")]);
    cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["--default-dialect", "sqlite", "resolve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sqlite/1.up.sql"));
}

// =============================================================================
// Validate Tests
// =============================================================================

#[test]
fn test_validate_missing_dialect_fails() {
    let dir = disk_tree(&[("sqlite/1.up.sql", "")]);
    cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["--label", "app", "validate", "--target", "postgres"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("validation failed for app"))
        .stderr(predicate::str::contains("postgres"));
}

#[test]
fn test_validate_warn_only_succeeds() {
    let dir = disk_tree(&[("sqlite/1.up.sql", "")]);
    cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["validate", "--target", "postgres", "--warn-only"])
        .assert()
        .success();
}

#[test]
fn test_validate_covered_dialects_succeed() {
    let dir = disk_tree(&[("common/0.up.sql", ""), ("sqlite/1.up.sql", "")]);
    cmd()
        .arg("--source")
        .arg(dir.path())
        .args(["validate", "-t", "postgres", "-t", "sqlite"])
        .assert()
        .success();
}

// =============================================================================
// Alias Tests
// =============================================================================

#[test]
fn test_aliases_include_overrides() {
    cmd()
        .args(["--alias", "maria=mysql", "aliases"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pg"))
        .stdout(predicate::str::contains("maria"));
}

#[test]
fn test_invalid_alias_fails() {
    cmd()
        .args(["--alias", "maria", "aliases"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid dialect alias"));
}
