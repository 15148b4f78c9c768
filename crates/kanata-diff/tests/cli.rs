use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use kanata_diff::{
    EXIT_DIVERGED, EXIT_FILE_ACCESS, EXIT_IDENTICAL, Error, StageSet, TraceError, compare_files,
};
use tempfile::TempDir;

const BASE: &str = "Kanata\t0004
C=\t100
I\t0\t0\t0
L\t0\t0\taddi a0, zero, 1
S\t0\t0\tIF
C\t1
S\t0\t0\tRN
S\t0\t2\tEX
I\t1\t0\t1
L\t1\t0\tld a1, 0(a0)
S\t1\t0\tIF
C\t3
S\t0\t0\tWB
S\t1\t1\tRN
C\t2
S\t0\t0\tCO
S\t1\t0\tEX
S\t1\t4\tWB
S\t1\t5\tCO
";

fn write_trace(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn run_library(left: &Path, right: &Path, stages: &StageSet) -> (i32, String) {
    let mut out = Vec::new();
    let code = compare_files(left, right, stages, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn run_binary(args: &[&PathBuf], extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kanata-diff"))
        .args(extra)
        .args(args)
        .arg("--color=never")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn identical_files_report_no_differences() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let b = write_trace(&dir, "b.kanata", BASE);

    let (code, out) = run_library(&a, &b, &StageSet::default());
    assert_eq!(code, EXIT_IDENTICAL);
    assert!(out.starts_with("Checking stages: CO, EX, IF, PNR, RN, WB\n\n"));
    assert!(out.contains(&format!("Parsing {}...", a.display())));
    assert!(out.contains(&format!("Parsing {}...", b.display())));
    assert!(out.contains(&format!("Found 2 instructions in {}", a.display())));
    assert!(out.contains("  Instructions with differences: 0"));
    assert!(out.contains("No differences found!"));
}

#[test]
fn shifted_stage_is_first_difference() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    // Instruction 1 writes back one cycle later.
    let b = write_trace(&dir, "b.kanata", &BASE.replace("S\t1\t4\tWB", "S\t1\t5\tWB"));

    let (code, out) = run_library(&a, &b, &StageSet::default());
    assert_eq!(code, EXIT_DIVERGED);
    assert!(out.contains("Instruction ID: 1"));
    assert!(out.contains("Instruction:    ld a1, 0(a0)"));
    let rows: Vec<&str> = out.lines().filter(|l| l.ends_with(" <-- DIFF")).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("WB"));
    assert!(rows[0].contains("110"));
    assert!(rows[0].contains("111"));
    assert!(out.contains("  First difference at instruction ID: 1"));

    // Not checking WB hides the difference.
    let (code, _) = run_library(&a, &b, &["IF", "EX", "CO"].into_iter().collect::<StageSet>());
    assert_eq!(code, EXIT_IDENTICAL);
}

#[test]
fn missing_file_is_file_access_error() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let missing = dir.path().join("missing.kanata");

    let err = compare_files(&a, &missing, &StageSet::default(), Vec::new()).unwrap_err();
    assert!(matches!(err, Error::Trace(TraceError::FileAccess { .. })));
    assert_eq!(err.exit_code(), EXIT_FILE_ACCESS);
}

#[test]
fn binary_exit_codes() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let b = write_trace(&dir, "b.kanata", BASE);
    let c = write_trace(&dir, "c.kanata", &BASE.replace("S\t0\t2\tEX", "S\t0\t3\tEX"));
    let missing = dir.path().join("missing.kanata");

    let same = run_binary(&[&a, &b], &[]);
    assert_eq!(same.status.code(), Some(0));

    let differ = run_binary(&[&a, &c], &[]);
    assert_eq!(differ.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&differ.stdout);
    assert!(stdout.contains("FIRST DIFFERENCE FOUND"));
    assert!(stdout.contains("Instruction ID: 0"));

    let gone = run_binary(&[&a, &missing], &[]);
    assert_eq!(gone.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&gone.stderr);
    assert!(stderr.contains("missing.kanata"));
}

#[test]
fn binary_unreadable_content_is_unexpected_error() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let bad = dir.path().join("bad.kanata");
    fs::write(&bad, b"C\t1\n\xff\xfe\n").unwrap();

    let out = run_binary(&[&a, &bad], &[]);
    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unexpected error"));
    assert!(stderr.contains("bad.kanata"));
    assert!(stderr.contains("line 2"));
    assert!(stderr.contains("caused by:"));
}

#[test]
fn binary_metrics_summary_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let c = write_trace(&dir, "c.kanata", &BASE.replace("S\t0\t2\tEX", "S\t0\t3\tEX"));

    let out = run_binary(&[&a, &c], &["--metrics"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("## Metrics Summary"));
    assert!(stderr.contains("kanata_instructions_checked_total: 2"));
    assert!(stderr.contains("kanata_instructions_total{trace=left}: 2"));
    assert!(stderr.contains("kanata_divergences_total{kind=stage_timing}: 1"));
    assert!(stderr.contains("kanata_parse_seconds{trace=right}"));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("Metrics Summary"));

    let plain = run_binary(&[&a, &c], &[]);
    assert!(!String::from_utf8_lossy(&plain.stderr).contains("Metrics Summary"));
}

#[test]
fn binary_stage_option_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let c = write_trace(&dir, "c.kanata", &BASE.replace("S\t0\t2\tEX", "S\t0\t3\tEX"));

    let out = run_binary(&[&a, &c], &["-s", "IF,WB", "--stages", "CO"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("Checking stages: CO, IF, WB"));

    let out = run_binary(&[&a, &c], &["-s", "IF", "-s", "EX"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn binary_warns_on_malformed_lines() {
    let dir = TempDir::new().unwrap();
    let a = write_trace(&dir, "a.kanata", BASE);
    let b = write_trace(&dir, "b.kanata", &format!("{BASE}S\t1\t9\nC\tbogus\n"));

    let out = run_binary(&[&a, &b], &[]);
    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("skipping malformed line").count(), 2);
    assert!(stderr.contains("line=20"));
    assert!(stderr.contains("line=21"));
    // Warnings never reach the report.
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("malformed"));
}
