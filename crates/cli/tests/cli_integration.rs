//! CLI integration tests for the `sift` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout and
//! stderr content. Filter and dialect fixtures are written to a TempDir so
//! the tests stay hermetic.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn sift() -> Command {
    Command::cargo_bin("sift").expect("sift binary should build")
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("fixture should be writable");
    path
}

const DIALECT: &str = r#"{
    "functions": ["length", "lcase"],
    "variables": ["action", "page_title"],
    "deprecated": ["article_text"],
    "disabled": ["old_links"]
}"#;

// ──────────────────────────────────────────────
// Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    sift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sift filter expression analyzer"));
}

#[test]
fn version_exits_0() {
    sift()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sift"));
}

// ──────────────────────────────────────────────
// Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_valid_filter_exits_0() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "ok.filter", "action == 'edit' & length(page_title) > 3");
    let dialect = write_file(&tmp, "dialect.json", DIALECT);

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn check_syntax_error_exits_1() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "broken.filter", "1 <");

    sift()
        .arg("check")
        .arg(&filter)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unexpected"));
}

#[test]
fn check_undefined_variable_exits_1() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "gated.filter", "nonsense_name");
    let dialect = write_file(&tmp, "dialect.json", DIALECT);

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("undefined"));
}

#[test]
fn check_deprecated_only_is_advisory() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "dated.filter", "article_text contains 'x'");
    let dialect = write_file(&tmp, "dialect.json", DIALECT);

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .assert()
        .success()
        .stderr(predicate::str::contains("use of deprecated"));

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .arg("--strict")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn check_reports_every_file() {
    let tmp = TempDir::new().expect("tempdir");
    let good = write_file(&tmp, "good.filter", "1 + 1");
    let bad = write_file(&tmp, "bad.filter", "(");

    sift()
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("1 of 2 filter(s) failed"));
}

#[test]
fn check_json_output_is_machine_readable() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "gated.filter", "nonsense_name");
    let dialect = write_file(&tmp, "dialect.json", DIALECT);

    let assert = sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .arg("--output")
        .arg("json")
        .assert()
        .failure();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let report: serde_json::Value =
        serde_json::from_str(&stdout).expect("report should be valid JSON");
    assert_eq!(report["checked"], 1);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["filters"][0]["ok"], false);
    assert!(report["filters"][0]["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("undefined")));
}

#[test]
fn check_max_depth_flag_applies() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "nested.filter", "((((1))))");

    sift().arg("check").arg(&filter).assert().success();

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--max-depth")
        .arg("5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("too deeply nested"));
}

#[test]
fn check_missing_file_exits_1() {
    sift()
        .arg("check")
        .arg("no_such_file.filter")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error reading"));
}

#[test]
fn check_bad_dialect_json_exits_1() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "ok.filter", "1");
    let dialect = write_file(&tmp, "dialect.json", "{not json");

    sift()
        .arg("check")
        .arg(&filter)
        .arg("--dialect")
        .arg(&dialect)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error parsing dialect JSON"));
}

// ──────────────────────────────────────────────
// Tokens subcommand
// ──────────────────────────────────────────────

#[test]
fn tokens_dumps_the_stream() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "ok.filter", "1 + page_title");

    sift()
        .arg("tokens")
        .arg(&filter)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("IntLiteral")
                .and(predicate::str::contains("Operator"))
                .and(predicate::str::contains("Identifier"))
                .and(predicate::str::contains("EndOfStream")),
        );
}

#[test]
fn tokens_json_output_parses() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "ok.filter", "0x1A");

    let assert = sift()
        .arg("tokens")
        .arg(&filter)
        .arg("--output")
        .arg("json")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let tokens: serde_json::Value =
        serde_json::from_str(&stdout).expect("tokens should be valid JSON");
    assert_eq!(tokens[0]["kind"], "IntLiteral");
    assert_eq!(tokens[0]["text"], "26");
}

#[test]
fn tokens_lexical_error_exits_1() {
    let tmp = TempDir::new().expect("tempdir");
    let filter = write_file(&tmp, "broken.filter", "'unclosed");

    sift()
        .arg("tokens")
        .arg(&filter)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unclosed string literal"));
}
