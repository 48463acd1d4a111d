//! End-to-end smoke tests for the binary surface.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_describes_collection_argument() {
    Command::cargo_bin("artvee-dl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("COLLECTION_URL"))
        .stdout(predicate::str::contains("--item-delay"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("artvee-dl")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("artvee-dl"));
}

#[test]
fn test_rejects_out_of_range_retries() {
    Command::cargo_bin("artvee-dl")
        .unwrap()
        .args(["-r", "99", "https://artvee.com/s_collection/1/"])
        .assert()
        .failure();
}
