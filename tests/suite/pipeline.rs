//! Save → analyze → publish, and the fix command, through `Session`.

use codesense_engine::{FileDocument, Session};
use codesense_lint::{AnalyzerConfig, map_findings, parse_report};
use codesense_providers::LlmConfig;
use codesense_types::{Position, Severity};
use wiremock::MockServer;

use crate::common::{RecordingHost, mount_chat_error, mount_chat_response, write_source};

#[cfg(unix)]
use crate::common::scripted_analyzer;

fn offline_llm() -> LlmConfig {
    LlmConfig::new("http://127.0.0.1:9", "codellama").with_max_retries(0)
}

#[test]
fn report_scenarios_map_to_expected_annotations() {
    let raw = "random text\n\
               test.py:3:4: E0001: unexpected indent\n\
               test.py:10:0: C0114: missing docstring\n\
               \n\
               ************* Module test\n";
    let annotations = map_findings(&parse_report(raw), "pylint");
    assert_eq!(annotations.len(), 2);

    assert_eq!(annotations[0].range().start, Position::new(2, 4));
    assert!(annotations[0].range().is_empty());
    assert_eq!(annotations[0].severity(), Severity::Error);
    assert_eq!(annotations[0].code().as_str(), "E0001");

    assert_eq!(annotations[1].range().start, Position::new(9, 0));
    assert_eq!(annotations[1].severity(), Severity::Warning);
    assert_eq!(annotations[1].message(), "missing docstring");

    assert!(parse_report("").is_empty());
}

#[tokio::test]
async fn fix_without_prior_analysis_sends_empty_report() {
    let server = MockServer::start().await;
    mount_chat_response(&server, "x = 1\n").await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "x=1\n");
    let session = Session::new(
        AnalyzerConfig::default(),
        &LlmConfig::new(server.uri(), "codellama"),
    )
    .unwrap();
    let mut host = RecordingHost::default();

    let doc = FileDocument::new(&file, "python");
    assert!(session.generate_fixed_code(&mut host, Some(&doc)).await);
    assert_eq!(host.opened, [("x = 1\n".to_string(), "python".to_string())]);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "codellama");
    assert_eq!(body["stream"], false);
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("x=1\n"));
    assert!(prompt.contains("### Issues detected by Pylint:\n\n"));
}

#[tokio::test]
async fn fix_failure_opens_nothing() {
    let server = MockServer::start().await;
    mount_chat_error(&server, 400, "invalid model name").await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "x=1\n");
    let session = Session::new(
        AnalyzerConfig::default(),
        &LlmConfig::new(server.uri(), "codellama"),
    )
    .unwrap();
    let mut host = RecordingHost::default();

    let doc = FileDocument::new(&file, "python");
    assert!(!session.generate_fixed_code(&mut host, Some(&doc)).await);
    assert!(host.opened.is_empty());
    assert_eq!(host.progress, ["Generating fixed code using LLM..."]);
    assert_eq!(
        host.errors,
        ["Error generating fixed code: LLM returned HTTP 400: invalid model name"]
    );
}

#[tokio::test]
async fn missing_analyzer_is_reported_and_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "x = 1\n");
    let analyzer = AnalyzerConfig::new("codesense-no-such-analyzer", vec![]);
    let mut session = Session::new(analyzer, &offline_llm()).unwrap();
    let mut host = RecordingHost::default();

    assert!(session.on_document_saved(&FileDocument::new(&file, "python")));
    session.drain(&mut host).await;

    assert_eq!(
        host.errors,
        ["Failed to run analyzer: codesense-no-such-analyzer not found in PATH"]
    );
    assert!(host.published.is_empty());
    assert!(session.lint().snapshot().files().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn multiple_files_publish_independently() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_source(dir.path(), "a.py", "import os\n");
    let b = write_source(dir.path(), "b.py", "print(x)\n");

    // Report depends on the content piped in.
    let analyzer = AnalyzerConfig::new(
        "sh",
        vec![
            "-c".to_string(),
            "content=$(cat); case \"$content\" in \
               *import*) printf 'a.py:1:0: W0611: Unused import os\\n' ;; \
               *) printf 'b.py:1:6: E0602: Undefined variable x\\n' ;; \
             esac"
                .to_string(),
        ],
    );
    let mut session = Session::new(analyzer, &offline_llm()).unwrap();
    let mut host = RecordingHost::default();

    session.on_document_saved(&FileDocument::new(&a, "python"));
    session.on_document_saved(&FileDocument::new(&b, "python"));
    session.drain(&mut host).await;

    assert!(host.errors.is_empty(), "{:?}", host.errors);
    let a_items = host.latest_for(&a).unwrap();
    assert_eq!(a_items.len(), 1);
    assert_eq!(a_items[0].severity(), Severity::Warning);
    let b_items = host.latest_for(&b).unwrap();
    assert_eq!(b_items[0].range().start, Position::new(0, 6));
    assert_eq!(b_items[0].severity(), Severity::Error);

    let snapshot = session.lint().snapshot();
    assert_eq!(snapshot.error_count(), 1);
    assert_eq!(snapshot.warning_count(), 1);
    // Files with errors sort first.
    assert_eq!(snapshot.files()[0].0.path(), b.canonicalize().unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn clean_rerun_clears_previous_annotations() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "print(bad)\n");
    let analyzer = AnalyzerConfig::new(
        "sh",
        vec![
            "-c".to_string(),
            "content=$(cat); case \"$content\" in \
               *bad*) printf 'app.py:1:6: E0602: Undefined variable bad\\n' ;; \
             esac"
                .to_string(),
        ],
    );
    let mut session = Session::new(analyzer, &offline_llm()).unwrap();
    let mut host = RecordingHost::default();
    let doc = FileDocument::new(&file, "python");

    session.on_document_saved(&doc);
    session.drain(&mut host).await;
    assert_eq!(host.latest_for(&file).unwrap().len(), 1);

    std::fs::write(&file, "print(1)\n").unwrap();
    session.on_document_saved(&doc);
    session.drain(&mut host).await;
    assert_eq!(host.latest_for(&file), Some(&[][..]));
    assert_eq!(host.published.len(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn overlapping_runs_last_to_finish_wins() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "x = 1\n");
    // The first run to claim the marker directory is slow; the other returns at once.
    let analyzer = AnalyzerConfig::new(
        "sh",
        vec![
            "-c".to_string(),
            "cat >/dev/null; \
             if mkdir .slow-run 2>/dev/null; then \
               sleep 0.5; printf 'app.py:1:0: E0001: slow run\\n'; \
             else \
               printf 'app.py:1:0: C0114: fast run\\n'; \
             fi"
            .to_string(),
        ],
    );
    let mut session = Session::new(analyzer, &offline_llm()).unwrap();
    let mut host = RecordingHost::default();
    let doc = FileDocument::new(&file, "python");

    assert!(session.on_document_saved(&doc));
    assert!(session.on_document_saved(&doc));
    assert_eq!(session.lint().in_flight(), 2);
    session.drain(&mut host).await;

    assert_eq!(host.published.len(), 2);
    assert_eq!(host.published[0].1[0].message(), "fast run");
    assert_eq!(host.published[1].1[0].message(), "slow run");

    let identity = &host.published[1].0;
    let current = session.lint().current(identity).unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].message(), "slow run");
    assert!(session
        .lint()
        .last_report(identity)
        .unwrap()
        .contains("E0001: slow run"));
}

#[cfg(unix)]
#[tokio::test]
async fn fix_uses_report_from_last_analysis() {
    let server = MockServer::start().await;
    mount_chat_response(&server, "\"\"\"Docs.\"\"\"\n").await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_source(dir.path(), "app.py", "\n");
    let analyzer = scripted_analyzer("app.py:1:0: C0114: Missing module docstring\\n");
    let mut session =
        Session::new(analyzer, &LlmConfig::new(server.uri(), "codellama")).unwrap();
    let mut host = RecordingHost::default();
    let doc = FileDocument::new(&file, "python");

    session.on_document_saved(&doc);
    session.drain(&mut host).await;
    assert!(session.generate_fixed_code(&mut host, Some(&doc)).await);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("app.py:1:0: C0114: Missing module docstring"));
    assert_eq!(host.opened[0].0, "\"\"\"Docs.\"\"\"\n");
}
