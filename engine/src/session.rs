//! Session service object: save-triggered analysis and the fix command.

use codesense_config::CodesenseConfig;
use codesense_lint::{AnalyzerConfig, LintManager, LintUpdate, resolve_identity};
use codesense_providers::fix;
use codesense_providers::{ChatError, LlmConfig, OllamaClient};

use crate::host::{EditorHost, TextDocument};

/// Maximum number of pipeline events applied per [`Session::pump`] call.
pub const EVENT_BUDGET: usize = 32;

const FIX_PROGRESS_TITLE: &str = "Generating fixed code using LLM...";
const NO_ACTIVE_EDITOR: &str = "No active editor found.";

pub struct Session {
    lint: LintManager,
    llm: OllamaClient,
}

impl Session {
    pub fn new(analyzer: AnalyzerConfig, llm: &LlmConfig) -> Result<Self, ChatError> {
        Ok(Self {
            lint: LintManager::new(analyzer),
            llm: OllamaClient::new(llm)?,
        })
    }

    pub fn from_config(config: &CodesenseConfig) -> Result<Self, ChatError> {
        let llm = config.llm();
        tracing::info!(
            analyzer = config.analyzer().command(),
            model = llm.model(),
            llm = llm.base_url(),
            "Session starting"
        );
        Self::new(config.analyzer(), &llm)
    }

    /// Swap the LLM client (tests use this to shorten retry delays).
    #[must_use]
    pub fn with_llm(mut self, llm: OllamaClient) -> Self {
        self.llm = llm;
        self
    }

    #[must_use]
    pub fn lint(&self) -> &LintManager {
        &self.lint
    }

    /// Start analysis of a saved document. Returns whether a run was started.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_document_saved(&mut self, document: &dyn TextDocument) -> bool {
        self.lint
            .on_document_saved(document.language_id(), document.path())
    }

    /// Apply whatever pipeline events are ready and publish them. Non-blocking.
    ///
    /// Returns the number of events applied.
    pub fn pump(&mut self, host: &mut dyn EditorHost) -> usize {
        let updates = self.lint.poll_events(EVENT_BUDGET);
        let count = updates.len();
        for update in updates {
            Self::publish(host, update);
        }
        count
    }

    /// Wait for every in-flight run, surfacing each update the moment it
    /// arrives.
    pub async fn drain(&mut self, host: &mut dyn EditorHost) {
        while let Some(update) = self.lint.next_update().await {
            Self::publish(host, update);
        }
    }

    fn publish(host: &mut dyn EditorHost, update: LintUpdate) {
        match update {
            LintUpdate::Published {
                identity,
                annotations,
            } => host.publish_diagnostics(&identity, &annotations),
            LintUpdate::Warning(message) => host.show_warning(&message),
            LintUpdate::Error(message) => host.show_error(&message),
        }
    }

    /// The "generate fixed code" command.
    ///
    /// Sends the active document and its last analyzer report to the LLM and
    /// opens the reply as a new untitled document. Every failure is reported
    /// through `host`. Returns whether a document was opened.
    pub async fn generate_fixed_code(
        &self,
        host: &mut dyn EditorHost,
        active: Option<&dyn TextDocument>,
    ) -> bool {
        let Some(document) = active else {
            host.show_error(NO_ACTIVE_EDITOR);
            return false;
        };

        let code = match document.text() {
            Ok(code) => code,
            Err(e) => {
                host.show_error(&format!("Failed to read file: {e}"));
                return false;
            }
        };
        let report = resolve_identity(document.path())
            .and_then(|identity| self.lint.last_report(&identity).map(str::to_string))
            .unwrap_or_default();

        host.show_progress(FIX_PROGRESS_TITLE);
        match fix::generate_fixed_code(&self.llm, &code, &report).await {
            Ok(fixed) => {
                host.open_untitled(&fixed, document.language_id());
                true
            }
            Err(e) => {
                tracing::warn!(path = %document.path().display(), "Fix generation failed: {e}");
                host.show_error(&format!("Error generating fixed code: {e}"));
                false
            }
        }
    }
}
