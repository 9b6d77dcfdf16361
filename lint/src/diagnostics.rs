//! Diagnostics store: current annotations per file, replaced wholesale.

use std::collections::HashMap;

use codesense_types::{Annotation, FileIdentity};

use crate::types::DiagnosticsSnapshot;

/// Keyed collection of the annotation set currently displayed for each file.
///
/// There is no partial update: [`DiagnosticsStore::replace`] overwrites the
/// whole set, so annotations from an earlier run never survive a later one.
/// An empty set is kept as an entry (the file was analyzed and is clean).
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    data: HashMap<FileIdentity, Vec<Annotation>>,
    /// Raw text of the last completed report per file, for fix requests.
    reports: HashMap<FileIdentity, String>,
}

impl DiagnosticsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, identity: FileIdentity, items: Vec<Annotation>) {
        self.data.insert(identity, items);
    }

    /// The annotation set currently displayed for `identity`.
    #[must_use]
    pub fn current(&self, identity: &FileIdentity) -> Option<&[Annotation]> {
        self.data.get(identity).map(Vec::as_slice)
    }

    pub fn record_report(&mut self, identity: FileIdentity, raw: String) {
        self.reports.insert(identity, raw);
    }

    #[must_use]
    pub fn last_report(&self, identity: &FileIdentity) -> Option<&str> {
        self.reports.get(identity).map(String::as_str)
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut files: Vec<(FileIdentity, Vec<Annotation>)> = self
            .data
            .iter()
            .map(|(id, items)| (id.clone(), items.clone()))
            .collect();

        // Sort: files with errors first, then alphabetically
        files.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors.cmp(&a_has_errors).then_with(|| a.0.cmp(&b.0))
        });

        DiagnosticsSnapshot::new(files)
    }
}
