//! Terminal rendition of the editor surface.
//!
//! Annotations go to stdout in compiler style; notifications go to stderr.
//! The "untitled document" of a fix is written to a file or stdout.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codesense_engine::EditorHost;
use codesense_types::{Annotation, FileIdentity};

pub(crate) struct TerminalHost<O: Write, E: Write> {
    out: O,
    err: E,
    /// Annotation paths are shown relative to this directory when possible.
    base_dir: Option<PathBuf>,
    /// Destination of `open_untitled`; stdout when unset.
    untitled_path: Option<PathBuf>,
    errors_shown: usize,
    opened: bool,
}

impl TerminalHost<io::Stdout, io::Stderr> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalHost<O, E> {
    pub(crate) fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            base_dir: std::env::current_dir().ok(),
            untitled_path: None,
            errors_shown: 0,
            opened: false,
        }
    }

    pub(crate) fn with_untitled_path(mut self, path: Option<PathBuf>) -> Self {
        self.untitled_path = path;
        self
    }

    #[cfg(test)]
    fn with_base_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.base_dir = dir;
        self
    }

    #[cfg(test)]
    pub(crate) fn out(&self) -> &O {
        &self.out
    }

    /// Number of error notifications shown so far.
    pub(crate) fn errors_shown(&self) -> usize {
        self.errors_shown
    }

    pub(crate) fn opened(&self) -> bool {
        self.opened
    }

    pub(crate) fn print_line(&mut self, line: &str) {
        // A closed stdout (e.g. `| head`) is not worth failing over.
        let _ = writeln!(self.out, "{line}");
    }

    fn display_path<'a>(&self, path: &'a Path) -> &'a Path {
        self.base_dir
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path)
    }

    fn write_untitled(&mut self, content: &str) -> io::Result<()> {
        match &self.untitled_path {
            Some(path) => fs::write(path, content),
            None => {
                self.out.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    self.out.write_all(b"\n")?;
                }
                self.out.flush()
            }
        }
    }
}

impl<O: Write, E: Write> EditorHost for TerminalHost<O, E> {
    fn show_error(&mut self, message: &str) {
        self.errors_shown += 1;
        let _ = writeln!(self.err, "error: {}", message.trim_end());
    }

    fn show_warning(&mut self, message: &str) {
        let _ = writeln!(self.err, "warning: {}", message.trim_end());
    }

    fn show_progress(&mut self, title: &str) {
        let _ = writeln!(self.err, "{title}");
    }

    fn publish_diagnostics(&mut self, identity: &FileIdentity, annotations: &[Annotation]) {
        let path = self.display_path(identity.path()).to_path_buf();
        tracing::debug!(file = %identity, count = annotations.len(), "Publishing diagnostics");
        for annotation in annotations {
            self.print_line(&annotation.display_with_path(&path));
        }
    }

    fn open_untitled(&mut self, content: &str, language_id: &str) {
        match self.write_untitled(content) {
            Ok(()) => {
                self.opened = true;
                if let Some(path) = &self.untitled_path {
                    tracing::info!(path = %path.display(), language = language_id, "Fixed code written");
                    let _ = writeln!(self.err, "Fixed code written to {}", path.display());
                }
            }
            Err(e) => self.show_error(&format!("Failed to write fixed code: {e}")),
        }
    }
}
