//! Core domain types for codesense.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.
//!
//! The pipeline these types describe:
//!
//! ```text
//! raw analyzer text -> Finding (1-based line, LintCode) -> Annotation (0-based point Range)
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod annotation;
mod code;
mod finding;
mod identity;

pub use annotation::{Annotation, Position, Range};
pub use code::{LintCode, LintCodeError, Severity};
pub use finding::{Finding, FindingError};
pub use identity::FileIdentity;
