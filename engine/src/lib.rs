//! Editor session for codesense.
//!
//! A [`Session`] owns the analysis pipeline and the LLM client. The embedding
//! editor (or the CLI) implements [`EditorHost`] and feeds it save events and
//! fix commands.

mod host;
mod session;

pub use host::{EditorHost, FileDocument, TextDocument};
pub use session::{EVENT_BUDGET, Session};
