//! End-to-end runs of the `codesense` binary.

#![cfg(unix)]

use std::path::Path;
use std::process::{Command, Output};

use wiremock::MockServer;

use crate::common::{mount_chat_response, write_source};

const BIN: &str = env!("CARGO_BIN_EXE_codesense");

fn write_config(dir: &Path, report: &str, llm_url: &str) -> std::path::PathBuf {
    let config = format!(
        r#"
[analyzer]
command = "sh"
args = ["-c", "cat >/dev/null; printf '{report}'"]

[llm]
base_url = "{llm_url}"
model = "codellama"
max_retries = 0
"#
    );
    write_source(dir, "config.toml", &config)
}

/// Run the binary with an isolated HOME so logs land in the temp dir.
fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("HOME", home)
        .env_remove("OLLAMA_HOST")
        .env_remove("CODESENSE_CONFIG")
        .env_remove("RUST_LOG")
        .current_dir(home)
        .output()
        .expect("run codesense")
}

#[test]
fn check_prints_annotations_and_fails_on_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "app.py:3:4: E0001: unexpected indent\\\\napp.py:10:0: C0114: missing docstring\\\\n",
        "http://127.0.0.1:9",
    );
    let file = write_source(dir.path(), "app.py", "x = 1\n");

    let output = run(
        dir.path(),
        &["check", "--config", config.to_str().unwrap(), file.to_str().unwrap()],
    );

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains(":3:5: error: [pylint E0001] unexpected indent"));
    assert!(stdout.contains(":10:1: warning: [pylint C0114] missing docstring"));
    assert!(stdout.trim_end().ends_with("E:1 W:1"));
}

#[test]
fn check_clean_file_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "", "http://127.0.0.1:9");
    let file = write_source(dir.path(), "app.py", "\"\"\"Doc.\"\"\"\n");

    let output = run(
        dir.path(),
        &["check", "--config", config.to_str().unwrap(), file.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "E:0 W:0\n");
}

#[test]
fn check_missing_file_reports_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "", "http://127.0.0.1:9");
    let missing = dir.path().join("missing.py");

    let output = run(
        dir.path(),
        &["check", "--config", config.to_str().unwrap(), missing.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error: Failed to read file: "), "{stderr}");
}

#[test]
fn check_skips_other_languages() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "", "http://127.0.0.1:9");
    let file = write_source(dir.path(), "notes.txt", "hello\n");

    let output = run(
        dir.path(),
        &["check", "--config", config.to_str().unwrap(), file.to_str().unwrap()],
    );

    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("not a python file"), "{stderr}");
}

#[tokio::test]
async fn fix_writes_llm_reply() {
    let server = MockServer::start().await;
    mount_chat_response(&server, "import sys\n").await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        "app.py:1:0: W0611: Unused import os\\\\n",
        &server.uri(),
    );
    let file = write_source(dir.path(), "app.py", "import os\n");
    let out = dir.path().join("fixed.py");

    let home = dir.path().to_path_buf();
    let args = vec![
        "fix".to_string(),
        "--config".to_string(),
        config.to_string_lossy().into_owned(),
        file.to_string_lossy().into_owned(),
        "--output".to_string(),
        out.to_string_lossy().into_owned(),
    ];
    let output = tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run(&home, &args)
    })
    .await
    .unwrap();

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(output.status.code(), Some(0), "{stderr}");
    assert!(stderr.contains("Generating fixed code using LLM..."));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "import sys\n");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("app.py:1:0: W0611: Unused import os"));
}
