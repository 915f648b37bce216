#![allow(deprecated)]
//! Contract tests for the `rlscheck` binary: exit codes, stdout/stderr split, JSON output.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

const CREDENTIAL_VARS: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_KEY",
    "SUPABASE_SERVICE_ROLE_KEY",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "CLAUDE_API_KEY",
    "RUST_LOG",
];

fn rlscheck(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("rlscheck").expect("rlscheck binary");
    cmd.current_dir(dir);
    for v in CREDENTIAL_VARS {
        cmd.env_remove(v);
    }
    cmd
}

#[test]
fn sql_prints_install_script_on_stdout() {
    let dir = tempdir().unwrap();
    rlscheck(dir.path())
        .arg("sql")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "CREATE OR REPLACE FUNCTION public.get_policies",
        ))
        .stderr(predicate::str::contains("SQL editor"));
}

#[test]
fn version_prints_package_version() {
    let dir = tempdir().unwrap();
    rlscheck(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn run_without_credentials_is_config_error() {
    let dir = tempdir().unwrap();
    rlscheck(dir.path())
        .args(["run", "posts"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing credential"));
}

#[test]
fn run_json_reports_failed_stage() {
    let dir = tempdir().unwrap();
    let output = rlscheck(dir.path())
        .args(["run", "posts", "--json"])
        .env("SUPABASE_URL", "https://abc.supabase.co")
        .env("SUPABASE_KEY", "k")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let doc: Value = serde_json::from_slice(&output.stdout).expect("JSON on stdout");
    assert_eq!(doc["stage"], "config");
    assert_eq!(doc["exit_code"], 2);
    assert!(doc["error"].as_str().unwrap().contains("OPENAI_API_KEY"));
}

#[test]
fn invalid_config_file_is_config_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("rlscheck.yaml"), "retryAttempts: 0\n").unwrap();
    rlscheck(dir.path())
        .args(["run", "posts"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("retryAttempts"));
}

#[test]
fn unknown_coverage_is_rejected_by_arg_parser() {
    let dir = tempdir().unwrap();
    rlscheck(dir.path())
        .args(["run", "posts", "--coverage", "exhaustive"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("basic|full|edge"));
}

#[test]
fn exec_missing_file_is_config_error() {
    let dir = tempdir().unwrap();
    rlscheck(dir.path())
        .args(["exec", "nope.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nope.json"));
}

#[test]
fn exec_against_unreachable_backend_fails_cases() {
    let dir = tempdir().unwrap();
    let cases = dir.path().join("cases.json");
    std::fs::write(
        &cases,
        r#"[{"method":"select","path":"posts","expectedStatus":200,"description":"read"}]"#,
    )
    .unwrap();

    let output = rlscheck(dir.path())
        .args(["exec", "cases.json", "--retries", "2", "--timeout-ms", "2000", "--json"])
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_KEY", "k")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let summary: Value = serde_json::from_slice(&output.stdout).expect("summary JSON");
    assert_eq!(summary["total"], 1);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["details"][0]["actual"], 500);
    assert_eq!(summary["details"][0]["attempts"], 2);
    assert_eq!(summary["table"], "posts");

    let results = std::fs::read_dir(dir.path().join("generated/results"))
        .unwrap()
        .count();
    assert_eq!(results, 1);
}

#[test]
fn exec_empty_case_file_is_config_error() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("empty.json"), "[]").unwrap();
    rlscheck(dir.path())
        .args(["exec", "empty.json"])
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_KEY", "k")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("contains no test cases"));
}

fn write_single_case(dir: &std::path::Path) {
    std::fs::write(
        dir.join("cases.json"),
        r#"[{"method":"select","path":"posts","expectedStatus":200,"description":"read"}]"#,
    )
    .unwrap();
}

#[test]
fn config_verbose_false_silences_per_case_logs() {
    let dir = tempdir().unwrap();
    write_single_case(dir.path());
    std::fs::write(dir.path().join("rlscheck.yaml"), "verbose: false\n").unwrap();

    rlscheck(dir.path())
        .args(["exec", "cases.json", "--retries", "1"])
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_KEY", "k")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("test case finished").not());
}

#[test]
fn default_config_logs_per_case() {
    let dir = tempdir().unwrap();
    write_single_case(dir.path());

    rlscheck(dir.path())
        .args(["exec", "cases.json", "--retries", "1"])
        .env("SUPABASE_URL", "http://127.0.0.1:9")
        .env("SUPABASE_KEY", "k")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("test case finished"));
}
