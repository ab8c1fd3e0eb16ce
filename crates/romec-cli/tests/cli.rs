//! End-to-end tests for the `romec` binary.
//!
//! Direct compiles go through the binary's own hidden `worker` subcommand,
//! so these cover the whole process round trip.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn romec(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_romec"))
        .args(args)
        .current_dir(cwd)
        .env_remove("ROMEC_WORKER_PROGRAM")
        .env_remove("ROMEC_EXTENSIONS")
        .env_remove("ROMEC_WORKER_TIMEOUT_SECS")
        .output()
        .expect("failed to run romec")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_direct_compile_writes_code_to_stdout() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app.js"), "// banner\nconst a = 1;\n\n\n\nlog(a);\n").unwrap();

    let output = romec(dir.path(), &["compile", "app"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "const a = 1;\n\nlog(a);\n");
}

#[test]
fn test_bundle_compile_includes_dependencies() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/index.ts"),
        "const m = require('./math');\nm.add(1, 2);\n",
    )
    .unwrap();
    fs::write(dir.path().join("src/math.ts"), "exports.add = (a, b) => a + b;\n").unwrap();

    let output = romec(dir.path(), &["compile", "--bundle", "src"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let code = stdout(&output);
    assert!(code.contains("path: \"math.ts\""));
    assert!(code.find("math.ts").unwrap() < code.find("index.ts").unwrap());
}

#[test]
fn test_diagnostics_exit_one_without_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.js"), "function f() {\n  debugger;\n").unwrap();

    let output = romec(dir.path(), &["compile", "broken.js"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("lint/noDebugger"));
    assert!(err.contains("Compile diagnostics: 2 diagnostic(s), 0 suppressed"));
}

#[test]
fn test_diagnostics_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.js"), "debugger;\n").unwrap();

    let output = romec(dir.path(), &["compile", "--diagnostics-json", "a.js"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    // log lines may precede the report
    let start = err.find("\n{\n").map(|i| i + 1).unwrap_or(0);
    let report: serde_json::Value = serde_json::from_str(&err[start..]).unwrap();
    assert_eq!(report["message"], "Compile diagnostics");
    assert_eq!(report["diagnostics"][0]["category"], "lint/noDebugger");
}

#[test]
fn test_wrong_arity_fails() {
    let dir = TempDir::new().unwrap();

    let output = romec(dir.path(), &["compile"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error[arity]"));

    let output = romec(dir.path(), &["compile", "a.js", "b.js"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error[arity]"));
}

#[test]
fn test_missing_entry_fails_resolution() {
    let dir = TempDir::new().unwrap();

    let output = romec(dir.path(), &["compile", "nowhere"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("error[resolution]"));
    assert!(stdout(&output).is_empty());
}
