//! End-to-end tests for CLI exit codes.
//!
//! These tests verify that the CLI returns the correct exit codes according
//! to the documented taxonomy:
//!
//! - Exit code 0: Success
//! - Exit code 2: Invalid command-line usage (handled by clap)
//! - Exit code 3: Precondition or I/O failure
//! - Exit code 4: Origin failure or unsupported operation
//! - Exit code 5: Manifest parse failure
//!
//! Only paths that need no network or external VCS tooling are exercised
//! here; origin-touching paths are covered through the library's
//! collaborator seams.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.arg("--version").assert().code(0);
}

/// Exit code 0 is returned for an empty spec file.
#[test]
fn test_exit_code_empty_spec() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file.write_str("# nothing to do\n").unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg(spec_file.path())
        .assert()
        .code(0);
}

/// Exit code 2 is returned for unknown command-line flags (handled by clap).
#[test]
fn test_exit_code_usage_unknown_flag() {
    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.arg("--unknown-flag-that-does-not-exist")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

/// Exit code 2 is returned for unknown subcommand.
#[test]
fn test_exit_code_usage_unknown_subcommand() {
    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.arg("unknown-subcommand-xyz")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

/// Exit code 2 is returned when the spec file argument is missing.
#[test]
fn test_exit_code_usage_missing_specfile() {
    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.arg("checkout").assert().code(2);
}

/// Exit code 3 is returned when the spec file does not exist.
#[test]
fn test_exit_code_spec_file_not_found() {
    let temp = assert_fs::TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg("nonexistent.spc")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error:"));
}

/// Exit code 5 is returned for a spec file neither reader accepts, and the
/// diagnostic mentions both readers.
#[test]
fn test_exit_code_malformed_spec() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file
        .write_str("definitely not a component spec\n")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg(spec_file.path())
        .assert()
        .code(5)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("legacy reader:"))
        .stderr(predicate::str::contains("config reader:"));
}

/// Exit code 4 is returned for operations the component kind does not
/// support, such as checking out a subversion component.
#[test]
fn test_exit_code_unsupported_operation() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file
        .write_str("svn vendor svn://example/x version 42\n")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg(spec_file.path())
        .assert()
        .code(4)
        .stderr(predicate::str::contains("error: not supported"));
}

/// Failures are reported as a single `error:` line on stderr.
#[test]
fn test_error_output_is_single_line() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file
        .write_str("svn vendor svn://example/x version 42\n")
        .unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    let output = cmd
        .current_dir(temp.path())
        .arg("checkout")
        .arg(spec_file.path())
        .output()
        .unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    let error_lines: Vec<&str> = stderr
        .lines()
        .filter(|line| line.starts_with("error:"))
        .collect();
    assert_eq!(error_lines.len(), 1, "stderr was: {}", stderr);
}
