//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use codesense_engine::EditorHost;
use codesense_lint::AnalyzerConfig;
use codesense_types::{Annotation, FileIdentity};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a non-streaming Ollama chat reply.
pub async fn mount_chat_response(server: &MockServer, content: &str) {
    let body = serde_json::json!({
        "model": "codellama",
        "created_at": "2024-01-01T00:00:00Z",
        "message": {"role": "assistant", "content": content},
        "done": true,
        "total_duration": 1_000_000,
        "eval_count": 20
    });

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount an Ollama error reply.
pub async fn mount_chat_error(server: &MockServer, status: u16, error: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({"error": error})))
        .mount(server)
        .await;
}

/// An analyzer that discards stdin and prints `report` (a shell `printf` format).
pub fn scripted_analyzer(report: &str) -> AnalyzerConfig {
    AnalyzerConfig::new(
        "sh",
        vec![
            "-c".to_string(),
            format!("cat >/dev/null; printf '{report}'"),
        ],
    )
}

/// Write `content` to `dir/name` and return the path.
pub fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write source file");
    path
}

/// Editor host that records everything it is asked to show.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub progress: Vec<String>,
    pub published: Vec<(FileIdentity, Vec<Annotation>)>,
    pub opened: Vec<(String, String)>,
}

impl RecordingHost {
    /// The most recent annotation set published for `path`.
    pub fn latest_for(&self, path: &Path) -> Option<&[Annotation]> {
        let canonical = path.canonicalize().ok()?;
        self.published
            .iter()
            .rev()
            .find(|(id, _)| id.path() == canonical)
            .map(|(_, items)| items.as_slice())
    }
}

impl EditorHost for RecordingHost {
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn show_progress(&mut self, title: &str) {
        self.progress.push(title.to_string());
    }

    fn publish_diagnostics(&mut self, identity: &FileIdentity, annotations: &[Annotation]) {
        self.published.push((identity.clone(), annotations.to_vec()));
    }

    fn open_untitled(&mut self, content: &str, language_id: &str) {
        self.opened.push((content.to_string(), language_id.to_string()));
    }
}
