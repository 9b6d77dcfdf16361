//! Analyzer invoker: runs one analyzer process over in-memory content.
//!
//! Each call owns its own output buffers; nothing is shared between
//! concurrent invocations. Stdin is written and closed while stdout and
//! stderr are drained, so a chatty analyzer can never deadlock on a full pipe.

use std::io;
use std::process::Stdio;

use codesense_types::FileIdentity;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::types::{AnalyzerConfig, AnalyzerRun, LintEvent};

const STDERR_CHUNK_BYTES: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("{command} not found in PATH")]
    NotFound {
        command: String,
        #[source]
        source: which::Error,
    },
    #[error("spawning {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("no {0} pipe from analyzer")]
    MissingPipe(&'static str),
    #[error("reading analyzer output: {0}")]
    Read(#[source] io::Error),
    #[error("waiting for analyzer: {0}")]
    Wait(#[source] io::Error),
}

/// Run the analyzer once over `content`.
///
/// Every stderr chunk is forwarded as [`LintEvent::Stderr`] as soon as it
/// arrives. Returns when the process has terminated, whatever its exit code.
pub async fn invoke(
    config: &AnalyzerConfig,
    identity: &FileIdentity,
    content: &str,
    events: &mpsc::Sender<LintEvent>,
) -> Result<AnalyzerRun, InvokeError> {
    let program = which::which(config.command()).map_err(|source| InvokeError::NotFound {
        command: config.command().to_string(),
        source,
    })?;

    let mut cmd = Command::new(&program);
    cmd.args(config.args())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Lets the analyzer pick up project-local settings next to the file.
    if let Some(dir) = identity.path().parent() {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| InvokeError::Spawn {
        command: config.command().to_string(),
        source,
    })?;
    tracing::debug!(file = %identity, pid = ?child.id(), "Analyzer started");

    let mut stdin = child.stdin.take().ok_or(InvokeError::MissingPipe("stdin"))?;
    let mut stdout = child.stdout.take().ok_or(InvokeError::MissingPipe("stdout"))?;
    let stderr = child.stderr.take().ok_or(InvokeError::MissingPipe("stderr"))?;

    let feed = async move {
        // Dropping stdin at the end of this block closes it (end of input).
        if let Err(e) = stdin.write_all(content.as_bytes()).await {
            // The analyzer may exit before consuming its input; its report
            // (if any) is still collected below.
            tracing::debug!(file = %identity, "Analyzer stdin closed early: {e}");
            return;
        }
        if let Err(e) = stdin.shutdown().await {
            tracing::debug!(file = %identity, "Closing analyzer stdin: {e}");
        }
    };

    let collect_stdout = async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    };

    let collect_stderr = forward_stderr(stderr, identity, events);

    let ((), stdout_bytes, stderr_done) = tokio::join!(feed, collect_stdout, collect_stderr);
    let stdout_bytes = stdout_bytes.map_err(InvokeError::Read)?;
    stderr_done.map_err(InvokeError::Read)?;

    let status = child.wait().await.map_err(InvokeError::Wait)?;
    tracing::debug!(
        file = %identity,
        status = %status,
        stdout_bytes = stdout_bytes.len(),
        "Analyzer terminated"
    );

    Ok(AnalyzerRun {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        exit_code: status.code(),
    })
}

/// Drain stderr, forwarding each chunk as soon as it is read.
///
/// A multi-byte character split across two reads is held back until its
/// remaining bytes arrive, so no chunk ends in the middle of a character.
async fn forward_stderr<R>(
    mut stderr: R,
    identity: &FileIdentity,
    events: &mpsc::Sender<LintEvent>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut pending = Vec::new();
    let mut buf = vec![0u8; STDERR_CHUNK_BYTES];
    loop {
        let n = stderr.read(&mut buf).await?;
        if n == 0 {
            // Whatever is left is a truncated character; emit it replaced.
            if !pending.is_empty() {
                send_stderr(events, identity, &pending).await;
            }
            return Ok(());
        }
        pending.extend_from_slice(&buf[..n]);
        let complete = complete_utf8_len(&pending);
        if complete == 0 {
            continue;
        }
        send_stderr(events, identity, &pending[..complete]).await;
        pending = pending.split_off(complete);
    }
}

async fn send_stderr(events: &mpsc::Sender<LintEvent>, identity: &FileIdentity, bytes: &[u8]) {
    // The receiver only goes away when the manager is dropped.
    let _ = events
        .send(LintEvent::Stderr {
            identity: identity.clone(),
            chunk: String::from_utf8_lossy(bytes).into_owned(),
        })
        .await;
}

/// Length of the longest prefix of `bytes` that does not end inside an
/// incomplete UTF-8 sequence. Invalid bytes count as complete.
fn complete_utf8_len(bytes: &[u8]) -> usize {
    let mut start = 0;
    loop {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(_) => return bytes.len(),
            Err(e) => match e.error_len() {
                Some(invalid) => start += e.valid_up_to() + invalid,
                None => return start + e.valid_up_to(),
            },
        }
    }
}
