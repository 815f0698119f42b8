//! Drives the compiled `sof` binary end to end with `assert_cmd`, matching
//! the pack's convention of a separate black-box `tests/cli.rs` alongside
//! in-process unit tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn inline_command_runs_and_prints_result() {
    Command::cargo_bin("sof")
        .unwrap()
        .arg("-c")
        .arg("1 2 + writeln")
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn version_flag_prints_version_and_exits_zero() {
    Command::cargo_bin("sof")
        .unwrap()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn preprocess_only_prints_cleaned_source_without_running_it() {
    Command::cargo_bin("sof")
        .unwrap()
        .arg("-p")
        .arg("-c")
        .arg("1 # trailing comment\n2 +")
        .assert()
        .success()
        .stdout(predicate::str::contains("1").and(predicate::str::contains("2 +")));
}

#[test]
fn runtime_error_exits_non_zero_with_kind_header() {
    Command::cargo_bin("sof")
        .unwrap()
        .arg("-c")
        .arg("1 0 /")
        .assert()
        .failure()
        .stderr(predicate::str::contains("math error"));
}

#[test]
fn undefined_identifier_reports_name_error() {
    Command::cargo_bin("sof")
        .unwrap()
        .arg("-c")
        .arg("not_bound_anywhere")
        .assert()
        .failure()
        .stderr(predicate::str::contains("name error"));
}

#[test]
fn missing_program_is_a_usage_error() {
    Command::cargo_bin("sof").unwrap().assert().failure();
}
