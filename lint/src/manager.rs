//! LintManager facade: public API consumed by the engine.
//!
//! The engine drives analysis through this single type. A save spawns one
//! independent pipeline task (read file → run analyzer → report back over a
//! channel). The manager applies completed reports to the store in the order
//! they arrive, so when two runs for the same file overlap, the one that
//! terminates last wins. Each update carries what it installed, so a host that
//! publishes updates one at a time shows every intermediate set.

use std::collections::HashMap;
use std::path::{self, Path};
use std::sync::Arc;

use codesense_types::{Annotation, FileIdentity};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::diagnostics::DiagnosticsStore;
use crate::invoker;
use crate::mapping::map_findings;
use crate::report::parse_report;
use crate::types::{
    AnalyzerConfig, AnalyzerRun, DiagnosticsSnapshot, LintEvent, LintUpdate, RunFailure,
};

/// Channel capacity for the event channel between pipeline tasks and the manager.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Resolve the store key for a document path.
///
/// Prefers the canonical path; falls back to the absolute spelling for files
/// that do not exist (the read will fail and be reported under that name).
#[must_use]
pub fn resolve_identity(path: &Path) -> Option<FileIdentity> {
    if path.as_os_str().is_empty() {
        return None;
    }
    let resolved = std::fs::canonicalize(path)
        .or_else(|_| path::absolute(path))
        .ok()?;
    FileIdentity::new(resolved)
}

/// Build extension → language map from config.
fn build_extension_map(config: &AnalyzerConfig) -> HashMap<String, String> {
    config
        .file_extensions()
        .iter()
        .map(|ext| {
            (
                ext.trim_start_matches('.').to_ascii_lowercase(),
                config.language_id().to_string(),
            )
        })
        .collect()
}

/// Public facade for the analysis pipeline.
pub struct LintManager {
    config: Arc<AnalyzerConfig>,
    store: DiagnosticsStore,
    event_rx: mpsc::Receiver<LintEvent>,
    event_tx: mpsc::Sender<LintEvent>,
    /// Maps file extension (e.g. "py") → language id (e.g. "python").
    extension_map: HashMap<String, String>,
    /// Pipeline tasks, joined so that a task that dies without reporting
    /// still ends its run.
    tasks: JoinSet<()>,
    /// Runs spawned but not yet completed or failed.
    in_flight: usize,
}

impl LintManager {
    #[must_use]
    pub fn new(config: AnalyzerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let extension_map = build_extension_map(&config);
        Self {
            config: Arc::new(config),
            store: DiagnosticsStore::new(),
            event_rx,
            event_tx,
            extension_map,
            tasks: JoinSet::new(),
            in_flight: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Language id for a plain file, inferred from its extension.
    #[must_use]
    pub fn language_for_path(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extension_map.get(&ext).map(String::as_str)
    }

    /// Handle a document-saved event.
    ///
    /// Documents in other languages are ignored. Returns whether a run was
    /// started. Must be called from within a Tokio runtime.
    pub fn on_document_saved(&mut self, language_id: &str, path: &Path) -> bool {
        if !self.config.enabled() || language_id != self.config.language_id() {
            return false;
        }

        let Some(identity) = resolve_identity(path) else {
            tracing::debug!(path = %path.display(), "No file identity, skipping analysis");
            return false;
        };

        let config = Arc::clone(&self.config);
        let events = self.event_tx.clone();
        let read_path = path.to_path_buf();
        self.in_flight += 1;
        tracing::debug!(file = %identity, in_flight = self.in_flight, "Starting analysis");

        self.tasks.spawn(async move {
            let event = match tokio::fs::read_to_string(&read_path).await {
                Err(e) => LintEvent::Failed {
                    identity,
                    reason: RunFailure::Read(e.to_string()),
                },
                Ok(content) => {
                    let outcome = invoker::invoke(&config, &identity, &content, &events).await;
                    match outcome {
                        Ok(run) => LintEvent::Completed { identity, run },
                        Err(e) => LintEvent::Failed {
                            identity,
                            reason: RunFailure::Invoke(e.to_string()),
                        },
                    }
                }
            };
            let _ = events.send(event).await;
        });
        true
    }

    /// Drain pending events from pipeline tasks, up to `budget`.
    ///
    /// Non-blocking: returns immediately if no events are available.
    pub fn poll_events(&mut self, budget: usize) -> Vec<LintUpdate> {
        let mut updates = Vec::new();
        while updates.len() < budget {
            match self.event_rx.try_recv() {
                Ok(event) => updates.push(self.handle_event(event)),
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        while updates.len() < budget {
            let Some(joined) = self.tasks.try_join_next() else {
                break;
            };
            updates.extend(self.handle_join(joined));
        }
        updates
    }

    /// Wait for the next update from an in-flight run.
    ///
    /// Returns `None` once every run has completed or failed. Updates are
    /// returned one at a time, in the order the runs produced them.
    pub async fn next_update(&mut self) -> Option<LintUpdate> {
        while self.in_flight > 0 {
            tokio::select! {
                biased;
                Some(event) = self.event_rx.recv() => return Some(self.handle_event(event)),
                Some(joined) = self.tasks.join_next() => {
                    if let Some(update) = self.handle_join(joined) {
                        return Some(update);
                    }
                }
                else => break,
            }
        }
        None
    }

    /// A task that returned normally has already sent its final event.
    fn handle_join(&mut self, joined: Result<(), JoinError>) -> Option<LintUpdate> {
        let e = joined.err()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        tracing::error!(in_flight = self.in_flight, "Analysis task failed: {e}");
        Some(LintUpdate::Error(format!("Analysis task failed: {e}")))
    }

    fn handle_event(&mut self, event: LintEvent) -> LintUpdate {
        match event {
            LintEvent::Stderr { identity, chunk } => {
                tracing::warn!(file = %identity, "Analyzer stderr: {}", chunk.trim_end());
                LintUpdate::Warning(format!("{} Error: {chunk}", self.stderr_label()))
            }
            LintEvent::Failed { identity, reason } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                tracing::warn!(file = %identity, "Analysis failed: {reason}");
                LintUpdate::Error(reason.to_string())
            }
            LintEvent::Completed { identity, run } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let annotations = self.apply_report(identity.clone(), run);
                LintUpdate::Published {
                    identity,
                    annotations,
                }
            }
        }
    }

    /// Install the report's annotations and return a copy of the new set.
    fn apply_report(&mut self, identity: FileIdentity, run: AnalyzerRun) -> Vec<Annotation> {
        let findings = parse_report(&run.stdout);
        let annotations = map_findings(&findings, self.config.source());
        tracing::debug!(
            file = %identity,
            exit_code = ?run.exit_code,
            count = annotations.len(),
            "Diagnostics updated"
        );
        self.store.replace(identity.clone(), annotations.clone());
        self.store.record_report(identity, run.stdout);
        annotations
    }

    /// "pylint" → "Pylint".
    fn stderr_label(&self) -> String {
        let mut chars = self.config.source().chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Analyzer".to_string(),
        }
    }

    /// Runs spawned but not yet finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// The annotation set currently displayed for `identity`.
    #[must_use]
    pub fn current(&self, identity: &FileIdentity) -> Option<&[Annotation]> {
        self.store.current(identity)
    }

    /// Raw text of the last completed report for `identity`.
    #[must_use]
    pub fn last_report(&self, identity: &FileIdentity) -> Option<&str> {
        self.store.last_report(identity)
    }

    /// Get an immutable snapshot of all diagnostics.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.store.snapshot()
    }

    /// Get a reference to the event sender (for testing).
    #[cfg(test)]
    pub(crate) fn event_tx(&self) -> &mpsc::Sender<LintEvent> {
        &self.event_tx
    }
}
