use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Stable key naming the file a set of annotations belongs to.
///
/// Wraps an absolute path. Callers resolve (canonicalize) the path before
/// constructing one so that two spellings of the same file share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FileIdentity(PathBuf);

impl FileIdentity {
    /// Returns `None` for relative or empty paths.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() || !path.is_absolute() {
            return None;
        }
        Some(Self(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
