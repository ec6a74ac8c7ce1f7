//! CLI end-to-end tests.
//!
//! These tests spawn the actual `docscan` binary and validate stdout/exit codes.
//!
//! Exit code expectations:
//! - 0: Success (unparseable sources included)
//! - 2: Invalid arguments
//! - 3: File not found

use std::io::Write;
use std::process::Command;

use serde_json::Value;
use tempfile::NamedTempFile;

/// Run docscan with given arguments and return (stdout, stderr, exit_code).
fn run_docscan(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_docscan"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute docscan");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn python_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".py")
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn analyzes_file_to_json() {
    let file = python_file(
        "\
import os

TIMEOUT: float = 2.5  #: Seconds to wait.

class Client:
    def __init__(self):
        self.retries = 3  #: Attempts before giving up.
",
    );
    let path = file.path().to_str().expect("utf-8 path");
    let (stdout, _stderr, exit_code) = run_docscan(&[path]);
    assert_eq!(exit_code, 0);

    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["file"], path);
    assert!(json.get("reason").is_none());

    let comments = json["comments"].as_array().expect("comments array");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["scope"], "");
    assert_eq!(comments[0]["name"], "TIMEOUT");
    assert_eq!(comments[0]["comment"], "Seconds to wait.");
    assert_eq!(comments[1]["scope"], "Client");
    assert_eq!(comments[1]["name"], "retries");

    assert_eq!(json["annotations"][0]["annotation"], "float");
    assert_eq!(json["definitions"][0]["qualname"], "Client");
    assert_eq!(json["definitions"][0]["kind"], "class");
    assert_eq!(json["definitions"][0]["start"], 5);
    assert_eq!(json["definitions"][0]["end"], 7);
    assert_eq!(json["order"][0]["qualname"], "os");
    assert_eq!(json["order"][0]["index"], 0);
}

#[test]
fn line_offset_and_compact_output() {
    let first = python_file("def f():\n    pass\n");
    let second = python_file("x = 1  #! custom\n");
    let (stdout, _stderr, exit_code) = run_docscan(&[
        "--compact",
        "--line-offset",
        "20",
        "--marker",
        "#!",
        first.path().to_str().expect("utf-8 path"),
        second.path().to_str().expect("utf-8 path"),
    ]);
    assert_eq!(exit_code, 0);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "one compact document per file");
    let first_json: Value = serde_json::from_str(lines[0]).expect("valid JSON");
    assert_eq!(first_json["definitions"][0]["start"], 21);
    assert_eq!(first_json["definitions"][0]["kind"], "function");
    let second_json: Value = serde_json::from_str(lines[1]).expect("valid JSON");
    assert_eq!(second_json["comments"][0]["comment"], "custom");
}

#[test]
fn unparseable_file_is_unavailable_not_an_error() {
    let file = python_file("def broken(:\n");
    let (stdout, _stderr, exit_code) = run_docscan(&[file.path().to_str().expect("utf-8 path")]);
    assert_eq!(exit_code, 0);

    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "unavailable");
    assert!(json["reason"].as_str().is_some());
    assert_eq!(json["definitions"], serde_json::json!([]));
}

#[test]
fn missing_file_returns_exit_3() {
    let (stdout, _stderr, exit_code) = run_docscan(&["/nonexistent/docscan/missing.py"]);
    assert_eq!(exit_code, 3, "expected exit code 3 for missing file");

    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["details"]["path"], "/nonexistent/docscan/missing.py");
}

#[test]
fn empty_marker_returns_exit_2() {
    let file = python_file("x = 1\n");
    let (stdout, _stderr, exit_code) =
        run_docscan(&["--marker", "", file.path().to_str().expect("utf-8 path")]);
    assert_eq!(exit_code, 2);

    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["error"]["code"], 2);
}
