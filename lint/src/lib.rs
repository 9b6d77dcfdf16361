//! Analyzer invocation and the report-to-diagnostics pipeline.
//!
//! ```text
//! save -> invoker (stdin/stdout/stderr) -> report::parse_report -> mapping::map_findings
//!      -> DiagnosticsStore::replace
//! ```

pub mod invoker;
pub mod mapping;
pub mod report;
pub mod types;

mod diagnostics;
mod manager;

pub use diagnostics::DiagnosticsStore;
pub use invoker::InvokeError;
pub use manager::{LintManager, resolve_identity};
pub use mapping::map_findings;
pub use report::parse_report;
pub use types::{
    AnalyzerConfig, AnalyzerRun, DiagnosticsSnapshot, LintEvent, LintUpdate, RunFailure,
};
