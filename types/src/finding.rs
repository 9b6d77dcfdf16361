use serde::Serialize;
use thiserror::Error;

use crate::code::{LintCode, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindingError {
    #[error("line numbers are 1-based, got 0")]
    ZeroLine,
}

/// One structured report line from the analyzer.
///
/// Positions are analyzer-native: `line` is 1-based and always at least 1,
/// `column` is 0-based. Fields are private so the line invariant holds for
/// every value in circulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    line: u32,
    column: u32,
    code: LintCode,
    message: String,
}

impl Finding {
    pub fn new(
        line: u32,
        column: u32,
        code: LintCode,
        message: impl Into<String>,
    ) -> Result<Self, FindingError> {
        if line == 0 {
            return Err(FindingError::ZeroLine);
        }
        Ok(Self {
            line,
            column,
            code,
            message: message.into(),
        })
    }

    /// 1-based line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 0-based column.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[must_use]
    pub fn code(&self) -> &LintCode {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}
