//! Public types consumed by the engine.
//!
//! These types define the interface between `codesense-lint` and
//! `codesense-engine`. The engine constructs an [`AnalyzerConfig`], receives
//! [`LintUpdate`]s, and reads [`DiagnosticsSnapshot`]s for display.

use std::fmt;

use codesense_types::{Annotation, FileIdentity, Severity};
use serde::Deserialize;

/// Configuration for the external analyzer.
///
/// ```toml
/// [analyzer]
/// command = "python"
/// args = ["-m", "pylint", "--from-stdin", "test.py"]
/// language_id = "python"
/// source = "pylint"
/// file_extensions = ["py", "pyi"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Whether saves trigger analysis. Default: true.
    enabled: bool,
    /// Executable, resolved through PATH.
    command: String,
    /// Arguments. The analyzer must read its target from stdin.
    args: Vec<String>,
    /// Language identifier of documents to analyze.
    language_id: String,
    /// Label attached to annotations and stderr warnings.
    source: String,
    /// Extensions used to infer the language of plain files.
    file_extensions: Vec<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "python".to_string(),
            args: ["-m", "pylint", "--from-stdin", "test.py"]
                .into_iter()
                .map(String::from)
                .collect(),
            language_id: "python".to_string(),
            source: "pylint".to_string(),
            file_extensions: vec!["py".to_string(), "pyi".to_string()],
        }
    }
}

impl AnalyzerConfig {
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Apply `map` to every string value (used for `${VAR}` expansion).
    #[must_use]
    pub fn map_strings(mut self, map: impl Fn(&str) -> String) -> Self {
        self.command = map(&self.command);
        self.args = self.args.iter().map(|a| map(a)).collect();
        self.language_id = map(&self.language_id);
        self.source = map(&self.source);
        self
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn file_extensions(&self) -> &[String] {
        &self.file_extensions
    }
}

/// Why a pipeline run ended without a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFailure {
    /// The document could not be read from disk.
    Read(String),
    /// The analyzer could not be started or its pipes failed.
    Invoke(String),
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(reason) => write!(f, "Failed to read file: {reason}"),
            Self::Invoke(reason) => write!(f, "Failed to run analyzer: {reason}"),
        }
    }
}

/// Raw output of one completed analyzer process.
///
/// Owned by exactly one run; consumed when the manager parses it.
#[derive(Debug, Clone)]
pub struct AnalyzerRun {
    pub stdout: String,
    /// Exit code, if the process exited normally. Recorded, never inspected.
    pub exit_code: Option<i32>,
}

/// An event emitted by a pipeline task.
#[derive(Debug)]
pub enum LintEvent {
    /// A chunk arrived on the analyzer's stderr.
    Stderr {
        identity: FileIdentity,
        chunk: String,
    },
    /// The analyzer terminated; a report may be available.
    Completed {
        identity: FileIdentity,
        run: AnalyzerRun,
    },
    /// The run ended before producing a report.
    Failed {
        identity: FileIdentity,
        reason: RunFailure,
    },
}

/// What the manager did with an event, for the host to surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintUpdate {
    /// The annotation set for this file was replaced with `annotations`.
    Published {
        identity: FileIdentity,
        annotations: Vec<Annotation>,
    },
    /// Non-fatal, user-visible warning.
    Warning(String),
    /// User-visible error; the run that produced it is over.
    Error(String),
}

/// Immutable snapshot of all diagnostics, suitable for UI rendering.
///
/// Counts are computed from the canonical source (`files`).
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    /// Per-file annotations, sorted with error-containing files first.
    files: Vec<(FileIdentity, Vec<Annotation>)>,
}

impl DiagnosticsSnapshot {
    pub(crate) fn new(files: Vec<(FileIdentity, Vec<Annotation>)>) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn files(&self) -> &[(FileIdentity, Vec<Annotation>)] {
        &self.files
    }

    fn count_by(&self, pred: impl Fn(&Annotation) -> bool) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|a| pred(a))
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by(|a| a.severity().is_error())
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by(|a| a.severity() == Severity::Warning)
    }

    #[must_use]
    pub fn info_count(&self) -> usize {
        self.count_by(|a| a.severity() == Severity::Information)
    }

    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    /// Format a compact status string like "E:3 W:5".
    #[must_use]
    pub fn status_string(&self) -> String {
        format!("E:{} W:{}", self.error_count(), self.warning_count())
    }
}
