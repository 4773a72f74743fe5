use std::io::Write;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::NamedTempFile;

fn config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8(stdout.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn prints_a_summary_per_replicate() {
    let file = config(r#"{"population": 80, "max_duration": 100}"#);
    let output = Command::cargo_bin("vaxnet")
        .unwrap()
        .args(["--config", file.path().to_str().unwrap()])
        .args(["--random-seed", "9", "--replicates", "2", "--threads", "2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["random_seed"], 9);
    assert_eq!(lines[1]["random_seed"], 10);
    assert_eq!(lines[1]["replicate"], 1);
}

#[test]
fn logging_does_not_touch_stdout() {
    let file = config(r#"{"population": 50, "max_duration": 60}"#);
    let output = Command::cargo_bin("vaxnet")
        .unwrap()
        .args(["-c", file.path().to_str().unwrap(), "-r", "2", "-l", "debug"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert_eq!(json_lines(&output.stdout).len(), 1);
    assert!(!output.stderr.is_empty());
}

#[test]
fn invalid_config_fails() {
    let file = config(r#"{"population": 10, "anti_vax_fraction": 2.0}"#);
    let output = Command::cargo_bin("vaxnet")
        .unwrap()
        .args(["--config", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .get_output()
        .clone();
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("anti_vax_fraction"));
}
