//! Integration tests for the parallelize CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary isolated from the user's own config files
fn parallelize(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("parallelize").unwrap();
    cmd.current_dir(temp_dir.path())
        .env("HOME", temp_dir.path())
        .env_remove("RUST_LOG");
    cmd
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("in parallel"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("parallelize"));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[cfg(unix)]
#[test]
fn test_run_keeps_input_order() {
    let temp_dir = TempDir::new().unwrap();
    // Earlier items sleep longer so they finish last
    parallelize(&temp_dir)
        .args(["run", "-j", "4", "--", "sh", "-c", "sleep 0.$((4 - $0)); echo $0", "{}"])
        .write_stdin("1\n2\n3\n")
        .assert()
        .success()
        .stdout("1\n2\n3\n");
}

#[cfg(unix)]
#[test]
fn test_run_appends_item_without_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["run", "--", "echo", "item"])
        .write_stdin("a\nb\nc\n")
        .assert()
        .success()
        .stdout("item a\nitem b\nitem c\n");
}

#[cfg(unix)]
#[test]
fn test_run_enumerate_injects_index() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["run", "-e", "-j", "2", "--", "echo", "{#}:{}"])
        .write_stdin("a\nb\nc\n")
        .assert()
        .success()
        .stdout("0:a\n1:b\n2:c\n");
}

#[cfg(unix)]
#[test]
fn test_run_index_placeholder_needs_enumerate() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["run", "--", "echo", "{#}"])
        .write_stdin("a\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--enumerate"));
}

#[cfg(unix)]
#[test]
fn test_run_failure_names_the_item() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["run", "-j", "2", "--", "sh", "-c", "echo $((10 / $0))", "{}"])
        .write_stdin("1\n0\n3\n")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("work item 1"));
}

#[cfg(unix)]
#[test]
fn test_run_reads_input_file_and_prints_json() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("items.txt"), "x\ny\n").unwrap();

    let assert = parallelize(&temp_dir)
        .args(["run", "--input", "items.txt", "--format", "json", "--", "echo", "[{}]"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(rows[0]["index"], 0);
    assert_eq!(rows[0]["item"], "x");
    assert_eq!(rows[0]["output"], "[x]");
    assert_eq!(rows[1]["output"], "[y]");
}

#[cfg(unix)]
#[test]
fn test_run_sequential_with_progress_keeps_stdout_clean() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["run", "--sequential", "--progress", "per-worker", "--", "echo"])
        .write_stdin("p\nq\n")
        .assert()
        .success()
        .stdout("p\nq\n");
}

#[test]
fn test_config_show_merges_layers() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("parallelize.toml"), "workers = 3\nchunk_size = 2\n").unwrap();

    parallelize(&temp_dir)
        .args(["config", "show", "--format", "json"])
        .env("PARALLELIZE_CHUNK_SIZE", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"workers\": 3"))
        .stdout(predicate::str::contains("\"chunk_size\": 5"));
}

#[test]
fn test_config_custom_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.yaml");
    fs::write(&config_path, "progress: overall\n").unwrap();

    parallelize(&temp_dir)
        .args(["config", "show", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("progress = \"overall\""));
}

#[test]
fn test_config_validate_rejects_zero_workers() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["config", "validate"])
        .env("PARALLELIZE_WORKERS", "0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("worker count must be at least 1"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["config", "show", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn test_bench_small_workload() {
    let temp_dir = TempDir::new().unwrap();
    parallelize(&temp_dir)
        .args(["bench", "--size", "1000", "--tasks", "8", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("speedup"))
        .stdout(predicate::str::contains("2 worker(s)"));
}
