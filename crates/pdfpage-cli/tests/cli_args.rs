//! Argument handling shared by every subcommand.

mod common;

use common::{cmd, two_page_pdf};
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("images"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn missing_file_fails() {
    cmd()
        .args(["info", "/nonexistent/missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn invalid_pdf_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_pdf(&dir, "bad.pdf", b"not a pdf");
    cmd()
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn page_zero_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = two_page_pdf(&dir);
    cmd()
        .arg("info")
        .arg(&path)
        .args(["--pages", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page 0 is invalid"));
}

#[test]
fn page_past_end_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = two_page_pdf(&dir);
    cmd()
        .arg("images")
        .arg(&path)
        .args(["--pages", "1-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds document page count"));
}
