//! Integration tests for the `procura` binary
//!
//! Every test runs in its own temporary directory so a stray `.procura.toml`
//! never leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NOTICE: &str = "<html><head><meta name=\"PubDate\" content=\"2021-05-04\"></head><body>\
    <p>项目名称：测试采购项目</p><p>采购人名称：某市财政局</p>\
    <table><tr><th>供应商名称</th><th>中标金额</th></tr>\
    <tr><td>某某科技有限公司</td><td>50万元</td></tr></table></body></html>";

/// Bytes no text encoding accepts.
const BINARY: &[u8] = b"\x00\x01\x02binary\x00";

/// Helper to create a CLI command running inside `dir`
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_procura"));
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write_inputs(dir: &Path) {
    fs::create_dir_all(dir.join("data/2021")).unwrap();
    fs::write(dir.join("data/a.html"), NOTICE).unwrap();
    fs::write(dir.join("data/2021/b.htm"), NOTICE.replace("测试采购项目", "第二个项目")).unwrap();
    fs::write(dir.join("data/readme.txt"), "not an announcement").unwrap();
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("fields"));
}

#[test]
fn test_extract_defaults_write_csv_and_jsonl() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());

    cli(dir.path())
        .arg("extract")
        .assert()
        .success()
        .stderr(predicate::str::contains("Total files:     2"))
        .stderr(predicate::str::contains("Succeeded:       2"));

    let jsonl = fs::read_to_string(dir.path().join("result/extracted.jsonl")).unwrap();
    let records: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    // sorted discovery: 2021/b.htm before a.html
    assert_eq!(records[0]["项目名称"], "第二个项目");
    assert_eq!(records[1]["项目名称"], "测试采购项目");
    assert_eq!(records[1]["公告时间"], "2021年05月04日");
    assert_eq!(records[1]["中标金额"], "500000.00");
    assert_eq!(records[1]["采购类别"], "其他");

    let csv = fs::read(dir.path().join("result/extracted.csv")).unwrap();
    assert!(csv.starts_with(&[0xEF, 0xBB, 0xBF]));
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.contains("\"=\"\"2021年05月04日\"\"\""));
}

#[test]
fn test_extract_explicit_dirs_and_format() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::rename(dir.path().join("data"), dir.path().join("notices")).unwrap();

    cli(dir.path())
        .args(["extract", "notices", "-o", "out", "--format", "csv", "-q"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());

    assert!(dir.path().join("out/extracted.csv").exists());
    assert!(!dir.path().join("out/extracted.jsonl").exists());
}

#[test]
fn test_failed_file_makes_exit_code_nonzero() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("data/broken.html"), BINARY).unwrap();

    cli(dir.path())
        .arg("extract")
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.html"))
        .stderr(predicate::str::contains("Failed:          1"));

    // records that succeeded are still written
    let jsonl = fs::read_to_string(dir.path().join("result/extracted.jsonl")).unwrap();
    assert_eq!(jsonl.lines().count(), 2);
}

#[test]
fn test_continue_on_error_succeeds() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(dir.path().join("data/broken.html"), BINARY).unwrap();

    cli(dir.path())
        .args(["extract", "--continue-on-error", "--parallel", "2"])
        .assert()
        .success();
}

#[test]
fn test_nothing_succeeded_writes_nothing() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/broken.html"), BINARY).unwrap();

    cli(dir.path())
        .args(["extract", "--continue-on-error"])
        .assert()
        .success()
        .stderr(predicate::str::contains("outputs not written"));

    assert!(!dir.path().join("result").exists());
}

#[test]
fn test_empty_file_gives_empty_record() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/empty.html"), "").unwrap();

    cli(dir.path())
        .args(["extract", "--format", "jsonl"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Succeeded:       1"));

    let jsonl = fs::read_to_string(dir.path().join("result/extracted.jsonl")).unwrap();
    let record: serde_json::Value = serde_json::from_str(jsonl.trim()).unwrap();
    assert_eq!(record["项目名称"], "");
    assert_eq!(record["采购类别"], "其他");
}

#[test]
fn test_missing_input_dir() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["extract", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input directory not found"));
}

#[test]
fn test_config_file_sets_defaults() {
    let dir = TempDir::new().unwrap();
    write_inputs(dir.path());
    fs::write(
        dir.path().join(".procura.toml"),
        "[extract]\noutput_dir = \"from-config\"\nformats = [\"jsonl\"]\n",
    )
    .unwrap();

    cli(dir.path()).arg("extract").assert().success();
    assert!(dir.path().join("from-config/extracted.jsonl").exists());
    assert!(!dir.path().join("from-config/extracted.csv").exists());
}

#[test]
fn test_config_schema_override_applies() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("data")).unwrap();
    fs::write(
        dir.path().join("data/a.html"),
        "<p>中选单位：某某咨询有限公司</p>",
    )
    .unwrap();
    fs::write(
        dir.path().join("procura.toml"),
        "[schema.\"供应商名称\"]\naliases = [\"中选单位\"]\n",
    )
    .unwrap();

    cli(dir.path())
        .args(["--config", "procura.toml", "extract", "--format", "jsonl"])
        .assert()
        .success();

    let jsonl = fs::read_to_string(dir.path().join("result/extracted.jsonl")).unwrap();
    assert!(jsonl.contains("\"供应商名称\":\"某某咨询有限公司\""));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.toml"), "[extract\n").unwrap();

    cli(dir.path())
        .args(["--config", "bad.toml", "fields"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_text_command_flattens_tables() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.html"), NOTICE).unwrap();

    cli(dir.path())
        .args(["text", "page.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("项目名称：测试采购项目"))
        .stdout(predicate::str::contains("供应商名称 | 中标金额"))
        .stdout(predicate::str::contains("某某科技有限公司 | 50万元"));
}

#[test]
fn test_text_command_missing_file() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["text", "missing.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.html"));
}

#[test]
fn test_fields_lists_table() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg("fields")
        .assert()
        .success()
        .stdout(predicate::str::contains("公告时间"))
        .stdout(predicate::str::contains("采购标的"))
        .stdout(predicate::str::contains("中标（成交）金额"));
}
