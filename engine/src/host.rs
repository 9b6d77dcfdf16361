//! The editor surface a [`Session`](crate::Session) drives.

use std::io;
use std::path::{Path, PathBuf};

use codesense_types::{Annotation, FileIdentity};

/// Notifications and documents the session hands back to the editor.
pub trait EditorHost {
    fn show_error(&mut self, message: &str);

    fn show_warning(&mut self, message: &str);

    /// A long-running operation has started.
    fn show_progress(&mut self, title: &str);

    /// Replace the annotations shown for `identity` with `annotations`.
    fn publish_diagnostics(&mut self, identity: &FileIdentity, annotations: &[Annotation]);

    /// Open `content` as a new unsaved document.
    fn open_untitled(&mut self, content: &str, language_id: &str);
}

/// A document as the editor sees it.
pub trait TextDocument {
    fn language_id(&self) -> &str;

    fn path(&self) -> &Path;

    /// Current text of the document.
    fn text(&self) -> io::Result<String>;
}

/// A document backed by a file on disk; the text is whatever was last saved.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    language_id: String,
}

impl FileDocument {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, language_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language_id: language_id.into(),
        }
    }
}

impl TextDocument for FileDocument {
    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn text(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}
