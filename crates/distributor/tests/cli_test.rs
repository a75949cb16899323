//! End-to-end tests for the distributor binary
//!
//! Each test runs the built binary in a scratch directory so no config file
//! from the workspace is picked up.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

const KEY: &str = "Some attribute key";
const VALUE: &str = "Some attribute value";
const OTHER_VALUE: &str = "Value with other hash";

fn distributor(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_distributor"));
    command.current_dir(dir).env_remove("RUST_LOG");
    command
}

fn record(value: &str) -> String {
    format!(
        "{{\"attributes\": {{\"{}\": \"{}\", \"filename\": \"data.json\"}}, \"content\": \"payload\"}}",
        KEY, value
    )
}

/// Three records with one value, two with another, one without the attribute
fn write_input(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("input.jsonl");
    let mut file = fs::File::create(&path).unwrap();
    for _ in 0..3 {
        writeln!(file, "{}", record(VALUE)).unwrap();
    }
    for _ in 0..2 {
        writeln!(file, "{}", record(OTHER_VALUE)).unwrap();
    }
    writeln!(file, "{{\"attributes\": {{\"filename\": \"orphan.json\"}}}}").unwrap();
    path
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).unwrap().lines().count()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

#[test]
fn test_run_to_directory_with_four_channels() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let output = distributor(dir.path())
        .args(["run", "--attribute", KEY, "--channels", "4", "--output-dir", "out", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = dir.path().join("out");
    assert_eq!(line_count(&out.join("1.jsonl")), 3);
    assert_eq!(line_count(&out.join("2.jsonl")), 0);
    assert_eq!(line_count(&out.join("3.jsonl")), 0);
    assert_eq!(line_count(&out.join("4.jsonl")), 2);
    assert_eq!(line_count(&out.join("Failure.jsonl")), 1);

    let failure = fs::read_to_string(out.join("Failure.jsonl")).unwrap();
    assert!(failure.contains("orphan.json"));

    let summary = stdout(&output);
    assert!(summary.starts_with("records: 6 received, 5 routed, 1 failure"));
    assert!(summary.contains("  Failure  1"));
}

#[test]
fn test_run_with_config_file() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    fs::write(
        dir.path().join("distributor.toml"),
        format!("[distributor]\nattribute_name = \"{}\"\nchannel_count = 2\n\n[metrics]\nenabled = false\n", KEY),
    )
    .unwrap();

    let output = distributor(dir.path())
        .args(["run", "--output-dir", "out", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = dir.path().join("out");
    assert_eq!(line_count(&out.join("1.jsonl")), 3);
    assert_eq!(line_count(&out.join("2.jsonl")), 2);
    assert_eq!(line_count(&out.join("Failure.jsonl")), 1);
    assert!(!out.join("3.jsonl").exists());
}

#[test]
fn test_run_to_stdout_from_stdin() {
    let dir = TempDir::new().unwrap();

    let mut child = distributor(dir.path())
        .args(["run", "--attribute", KEY, "--channels", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    {
        let mut stdin = child.stdin.take().unwrap();
        writeln!(stdin, "{}", record(OTHER_VALUE)).unwrap();
        writeln!(stdin, "not a record").unwrap();
    }

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["channel"], "2");
    assert_eq!(lines[0]["record"]["attributes"][KEY], OTHER_VALUE);
    assert_eq!(lines[0]["record"]["content"], "payload");

    // Summary and diagnostics stay off the data stream
    let diagnostics = stderr(&output);
    assert!(diagnostics.contains("1 invalid lines skipped"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_with_open_stdin_exits() {
    let dir = TempDir::new().unwrap();

    let mut child = distributor(dir.path())
        .args(["run", "--attribute", KEY, "--channels", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Stdin stays open for the whole test, as on an interactive terminal
    let mut stdin = child.stdin.take().unwrap();
    writeln!(stdin, "{}", record(VALUE)).unwrap();
    stdin.flush().unwrap();

    let mut stderr = BufReader::new(child.stderr.take().unwrap());
    let mut line = String::new();
    while !line.contains("dispatcher starting") {
        line.clear();
        assert!(stderr.read_line(&mut line).unwrap() > 0, "distributor exited early");
    }
    thread::sleep(Duration::from_millis(500));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("distributor did not exit after SIGINT");
        }
        thread::sleep(Duration::from_millis(20));
    };
    assert_eq!(status.code(), Some(130));

    let mut diagnostics = String::new();
    stderr.read_to_string(&mut diagnostics).unwrap();
    assert!(diagnostics.contains("(interrupted)"), "stderr: {diagnostics}");
    drop(stdin);
}

#[test]
fn test_missing_attribute_warning_logged() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.jsonl");
    fs::write(&input, "{\"attributes\": {\"other\": \"x\"}}\n").unwrap();

    let output = distributor(dir.path())
        .args(["run", "--attribute", "tenant", "--output-dir", "out", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    assert!(stderr(&output).contains("routing attribute 'tenant' not found on record"));
    assert_eq!(line_count(&dir.path().join("out/Failure.jsonl")), 1);
}

#[test]
fn test_run_without_attribute_fails() {
    let dir = TempDir::new().unwrap();

    let output = distributor(dir.path())
        .args(["run", "--input", "missing.jsonl"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("no routing attribute configured"));
}

#[test]
fn test_stdout_logging_conflicts_with_stdout_records() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("distributor.toml"), "[log]\noutput = \"stdout\"\n").unwrap();

    let output = distributor(dir.path())
        .args(["run", "--attribute", KEY])
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("would mix log lines into routed records"));
}

#[test]
fn test_invalid_channel_count_fails() {
    let dir = TempDir::new().unwrap();

    let output = distributor(dir.path())
        .args(["channels", "--channels", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid --channels value"));
}

#[test]
fn test_channels_command() {
    let dir = TempDir::new().unwrap();

    let output = distributor(dir.path())
        .args(["channels", "--channels", "3"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "1\n2\n3\nFailure\n");
}

#[test]
fn test_hash_command() {
    let dir = TempDir::new().unwrap();

    let output = distributor(dir.path())
        .args(["hash", VALUE, OTHER_VALUE, "--channels", "4"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Some attribute value\t-1070216312\t1\nValue with other hash\t-1735151925\t4\n"
    );
}
