//! Subcommand implementations on top of [`Session`].

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, SystemTime};

use codesense_engine::{EditorHost, FileDocument, Session};

use crate::terminal::TerminalHost;

/// Exit status when error-severity annotations were reported.
const EXIT_FINDINGS: u8 = 1;
/// Exit status when a run itself failed (unreadable file, analyzer missing, LLM error).
const EXIT_FAILURE: u8 = 2;

/// Language used for files whose extension the analyzer does not claim.
const UNKNOWN_LANGUAGE: &str = "plaintext";

fn document_for(session: &Session, path: &Path) -> FileDocument {
    let language = session
        .lint()
        .language_for_path(path)
        .unwrap_or(UNKNOWN_LANGUAGE)
        .to_string();
    FileDocument::new(path, language)
}

/// Treat `path` as saved. Returns whether analysis started.
fn save(session: &mut Session, host: &mut dyn EditorHost, path: &Path) -> bool {
    let document = document_for(session, path);
    let started = session.on_document_saved(&document);
    if !started {
        host.show_warning(&format!(
            "Skipping {}: not a {} file",
            path.display(),
            session.lint().config().language_id()
        ));
    }
    started
}

pub(crate) async fn check<O: Write, E: Write>(
    session: &mut Session,
    host: &mut TerminalHost<O, E>,
    files: &[PathBuf],
) -> ExitCode {
    for file in files {
        save(session, host, file);
    }
    session.drain(host).await;

    let snapshot = session.lint().snapshot();
    host.print_line(&snapshot.status_string());
    tracing::info!(
        files = files.len(),
        errors = snapshot.error_count(),
        warnings = snapshot.warning_count(),
        infos = snapshot.info_count(),
        "Check finished"
    );

    if host.errors_shown() > 0 {
        ExitCode::from(EXIT_FAILURE)
    } else if snapshot.error_count() > 0 {
        ExitCode::from(EXIT_FINDINGS)
    } else {
        ExitCode::SUCCESS
    }
}

/// Analyze `file` so its report is current, then ask the LLM for a fix.
///
/// Annotations from the analysis go to stderr so stdout carries only code.
pub(crate) async fn fix<O: Write, E: Write>(
    session: &mut Session,
    host: &mut TerminalHost<O, E>,
    quiet_host: &mut dyn EditorHost,
    file: &Path,
) -> ExitCode {
    save(session, quiet_host, file);
    session.drain(quiet_host).await;

    let document = document_for(session, file);
    let opened = session.generate_fixed_code(host, Some(&document)).await;
    if opened && host.opened() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Modification times of the watched files, as last seen.
struct Watcher {
    seen: HashMap<PathBuf, Option<SystemTime>>,
}

impl Watcher {
    fn new(files: &[PathBuf]) -> Self {
        Self {
            seen: files.iter().map(|f| (f.clone(), modified(f))).collect(),
        }
    }

    /// Files whose modification time moved since the last call.
    ///
    /// A file that disappears is not reported; it is reported again once it
    /// reappears.
    fn changed(&mut self) -> Vec<PathBuf> {
        let mut changed = Vec::new();
        for (file, seen) in &mut self.seen {
            let current = modified(file);
            if current.is_some() && current != *seen {
                changed.push(file.clone());
            }
            *seen = current;
        }
        changed.sort();
        changed
    }
}

/// One watch tick: re-save changed files, then publish whatever is ready.
///
/// Prints the status line after every tick that applied an update, including
/// ones that leave no findings. Returns the number of updates applied.
fn watch_step<O: Write, E: Write>(
    session: &mut Session,
    host: &mut TerminalHost<O, E>,
    watcher: &mut Watcher,
) -> usize {
    for file in watcher.changed() {
        tracing::debug!(path = %file.display(), "Change detected");
        save(session, host, &file);
    }
    let applied = session.pump(host);
    if applied > 0 {
        host.print_line(&session.lint().snapshot().status_string());
    }
    applied
}

/// Re-analyze each file whenever its modification time changes, until Ctrl-C.
pub(crate) async fn watch<O: Write, E: Write>(
    session: &mut Session,
    host: &mut TerminalHost<O, E>,
    files: &[PathBuf],
    interval: Duration,
) -> anyhow::Result<ExitCode> {
    let mut watcher = Watcher::new(files);
    for file in files {
        save(session, host, file);
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                break;
            }
            _ = ticker.tick() => {
                watch_step(session, host, &mut watcher);
            }
        }
    }

    tracing::info!(in_flight = session.lint().in_flight(), "Watch stopped");
    session.drain(host).await;
    Ok(ExitCode::SUCCESS)
}
