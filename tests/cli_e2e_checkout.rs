//! End-to-end tests for the `checkout` subcommand surface.
//!
//! Network-touching checkout paths are exercised through the library's
//! collaborator seams; these tests cover destination preconditions and
//! idempotence, which need no origin access.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// A tarball component whose destination already exists is treated as
/// already materialized: the run succeeds and the tree is untouched.
#[test]
fn test_checkout_tarball_skips_existing_destination() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file
        .write_str("tarball zlib https://example/zlib-1.3.tar.gz\n")
        .unwrap();
    let existing = temp.child("src/zlib/README");
    existing.write_str("already checked out\n").unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg("--srcdir")
        .arg("src")
        .arg(spec_file.path())
        .assert()
        .code(0);
    existing.assert("already checked out\n");
}

/// A git component whose destination already exists fails with exit code 3
/// and leaves the existing directory untouched.
#[test]
fn test_checkout_git_rejects_existing_destination() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    spec_file
        .write_str("git pinned https://example/pinned.git version v1.0\n")
        .unwrap();
    let existing = temp.child("src/pinned/keep.txt");
    existing.write_str("precious\n").unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg("--srcdir")
        .arg("src")
        .arg(spec_file.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));
    existing.assert("precious\n");
}

/// Components are processed in name order, so a failing component aborts
/// the batch while earlier (skipped) components are unaffected.
#[test]
fn test_checkout_batch_stops_at_first_failure() {
    let temp = assert_fs::TempDir::new().unwrap();
    let spec_file = temp.child("components.spc");
    // "aaa" skips (already present), "bbb" fails the precondition check.
    spec_file
        .write_str(
            "tarball aaa https://example/aaa.tar.gz\n\
             git bbb https://example/bbb.git version v1\n",
        )
        .unwrap();
    temp.child("src/aaa/.keep").write_str("").unwrap();
    temp.child("src/bbb/.keep").write_str("").unwrap();

    let mut cmd = cargo_bin_cmd!("source-fetch");

    cmd.current_dir(temp.path())
        .arg("checkout")
        .arg("--srcdir")
        .arg("src")
        .arg(spec_file.path())
        .assert()
        .code(3);
    // The skipped component's tree is still there.
    temp.child("src/aaa/.keep").assert(predicate::path::exists());
}
