//! Integration tests for the `simplec` binary itself — spawns the compiled
//! executable against a temporary source file and inspects its exit status
//! and stdout, rather than calling into `simple_lang` directly (that's
//! covered by `simple-lang`'s own test suite).

use std::io::Write;
use std::process::Command;

fn write_source(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp source file");
    file.write_all(contents.as_bytes()).expect("write temp source file");
    file
}

fn simplec() -> Command {
    Command::new(env!("CARGO_BIN_EXE_simplec"))
}

#[test]
fn check_succeeds_on_a_valid_program() {
    let file = write_source("return 1+2*3;");
    let output = simplec().arg("check").arg(file.path()).output().expect("run simplec check");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ok"));
}

#[test]
fn check_fails_on_a_malformed_program() {
    let file = write_source("return 007;");
    let output = simplec().arg("check").arg(file.path()).output().expect("run simplec check");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("leading zero"));
}

#[test]
fn graph_emits_graphviz_for_a_valid_program() {
    let file = write_source("return 1;");
    let output = simplec().arg("graph").arg(file.path()).output().expect("run simplec graph");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("digraph sea_of_nodes {"));
}

#[test]
fn check_reports_a_missing_file() {
    let output = simplec().arg("check").arg("/nonexistent/path/does/not/exist.simple").output().expect("run simplec check");
    assert!(!output.status.success());
}
