//! Analyzer message codes and the severity derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of digits following the category letter.
const CODE_DIGITS: usize = 4;

/// Severity level for an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
}

impl Severity {
    /// Classify a code category letter.
    ///
    /// `E` (error) and `F` (fatal) are errors, `I` is informational, and every
    /// other category (convention, refactor, warning, ...) is a warning.
    #[must_use]
    pub fn from_category(letter: char) -> Self {
        match letter {
            'E' | 'F' => Self::Error,
            'I' => Self::Information,
            _ => Self::Warning,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintCodeError {
    #[error("lint code must be one uppercase letter and {CODE_DIGITS} digits, got {0:?}")]
    Malformed(String),
}

/// A message code such as `E0001` or `C0114`.
///
/// Always exactly one ASCII uppercase letter followed by exactly four ASCII
/// digits. The only construction path is [`LintCode::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LintCode(String);

impl LintCode {
    pub fn parse(raw: &str) -> Result<Self, LintCodeError> {
        let mut chars = raw.chars();
        let well_formed = chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && raw.len() == CODE_DIGITS + 1
            && chars.all(|c| c.is_ascii_digit());
        if well_formed {
            Ok(Self(raw.to_string()))
        } else {
            Err(LintCodeError::Malformed(raw.to_string()))
        }
    }

    /// The leading category letter.
    #[must_use]
    pub fn category(&self) -> char {
        // Invariant: non-empty ASCII, checked in `parse`.
        self.0.as_bytes()[0] as char
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_category(self.category())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LintCode {
    type Err = LintCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LintCode {
    type Error = LintCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LintCode> for String {
    fn from(value: LintCode) -> Self {
        value.0
    }
}
