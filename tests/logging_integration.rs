use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const STARTUP_MESSAGE: &str = "loaded runtime configuration";

struct StartupRun {
    stderr: String,
    succeeded: bool,
}

/// Starts the server with an unusable bind address so it logs its
/// configuration and then exits.
fn start_with_bad_bind(log_output: &str, log_format: &str, log_file: Option<&Path>) -> StartupRun {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_healthplan"));
    cmd.env("BIND_ADDR", "not-an-address")
        .env("RUST_LOG", "healthplan=info")
        .env("LOG_OUTPUT", log_output)
        .env("LOG_FORMAT", log_format)
        .env_remove("GLM_API_KEY");
    match log_file {
        Some(path) => cmd.env("LOG_FILE_PATH", path),
        None => cmd.env_remove("LOG_FILE_PATH"),
    };

    let output = cmd.output().expect("failed to run healthplan binary");
    StartupRun {
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        succeeded: output.status.success(),
    }
}

fn scratch_dir(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "healthplan-logging-{label}-{nanos}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

/// The daily appender suffixes the file name with the date.
fn read_rolled_log(dir: &Path) -> String {
    let path = fs::read_dir(dir)
        .expect("failed to read temp directory")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("healthplan.log."))
        })
        .max()
        .expect("expected a rolled log file to be created");
    fs::read_to_string(path).expect("failed to read rolled log file")
}

#[test]
fn bad_bind_address_is_reported_on_stderr() {
    let run = start_with_bad_bind("stderr", "pretty", None);
    assert!(!run.succeeded, "bad BIND_ADDR should fail start-up");
    assert!(
        run.stderr.contains("Invalid BIND_ADDR"),
        "expected bind error, got:\n{}",
        run.stderr
    );
    assert!(run.stderr.contains(STARTUP_MESSAGE));
}

#[test]
fn json_format_emits_parseable_lines() {
    let run = start_with_bad_bind("stderr", "json", None);
    assert!(!run.succeeded);

    let entries: Vec<Value> = run
        .stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("line should be valid JSON"))
        .collect();
    assert!(
        entries.iter().any(|entry| {
            entry.pointer("/fields/message").and_then(Value::as_str) == Some(STARTUP_MESSAGE)
        }),
        "expected startup message in JSON output, got:\n{}",
        run.stderr
    );
}

#[test]
fn file_output_keeps_logs_off_stderr() {
    let dir = scratch_dir("file");
    let run = start_with_bad_bind("file", "pretty", Some(&dir.join("healthplan.log")));
    assert!(!run.succeeded);

    assert!(read_rolled_log(&dir).contains(STARTUP_MESSAGE));
    assert!(
        !run.stderr.contains(STARTUP_MESSAGE),
        "file-only mode leaked logs to stderr:\n{}",
        run.stderr
    );
    assert!(run.stderr.contains("Invalid BIND_ADDR"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn both_output_writes_to_file_and_stderr() {
    let dir = scratch_dir("both");
    let run = start_with_bad_bind("both", "pretty", Some(&dir.join("healthplan.log")));
    assert!(!run.succeeded);

    assert!(read_rolled_log(&dir).contains(STARTUP_MESSAGE));
    assert!(run.stderr.contains(STARTUP_MESSAGE));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unwritable_log_path_falls_back_to_stderr() {
    let dir = scratch_dir("fallback");
    let blocker = dir.join("plain-file");
    fs::write(&blocker, "block").expect("failed to create blocking file");

    let run = start_with_bad_bind("file", "pretty", Some(&blocker.join("healthplan.log")));
    assert!(!run.succeeded);
    assert!(
        run.stderr.contains("failed to initialize LOG_OUTPUT=file"),
        "expected fallback warning, got:\n{}",
        run.stderr
    );
    assert!(run.stderr.contains("using stderr instead"));
    assert!(run.stderr.contains(STARTUP_MESSAGE));

    let _ = fs::remove_dir_all(&dir);
}
