//! Integration tests for the nlq binary.
//!
//! These exercise argument parsing and early failure paths only — actually
//! answering a question needs a live database and a reachable LLM endpoint,
//! neither of which this suite stands up.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("nlq").unwrap()
}

#[test]
fn test_help() {
    cmd().arg("--help").assert().success().stdout(predicate::str::contains("natural-language"));
}

#[test]
fn test_version() {
    cmd().arg("--version").assert().success();
}

#[test]
fn test_missing_question_fails() {
    cmd()
        .args(["--database-url", "sqlite://./warehouse.db"])
        .assert()
        .failure();
}

#[test]
fn test_unsupported_database_url_fails_fast() {
    cmd()
        .args(["--database-url", "mongodb://localhost/warehouse", "how many users are there"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported database URL"));
}

#[test]
fn test_missing_api_key_fails_after_connecting() {
    // sqlite:// URLs don't require a reachable server, so this gets far
    // enough to hit the missing LLM_API_KEY check.
    cmd()
        .env_remove("LLM_API_KEY")
        .args(["--database-url", "sqlite://./nlq-cli-test.db", "how many users are there"])
        .assert()
        .failure();
}
