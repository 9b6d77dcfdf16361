//! codesense CLI - binary entry point.
//!
//! Drives a [`codesense_engine::Session`] from the terminal: files named on
//! the command line stand in for saved editor documents, and a
//! [`terminal::TerminalHost`] stands in for the editor surface.
//!
//! ```text
//! main() -> Cli::parse() -> init_tracing() -> Session::from_config()
//!        -> check | fix | watch
//! ```

mod commands;
mod terminal;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codesense_config::CodesenseConfig;
use codesense_engine::Session;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::terminal::TerminalHost;

#[derive(Parser)]
#[command(name = "codesense", version)]
#[command(about = "Run pylint over Python files and generate fixes with a local LLM")]
struct Cli {
    /// Config file (default: ~/.codesense/config.toml)
    #[arg(long, global = true, env = "CODESENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files and print their annotations (exit 1 on errors)
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Analyze a file, then ask the LLM for a fixed version
    Fix {
        file: PathBuf,
        /// Write the fixed code here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-analyze files whenever they change on disk
    Watch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stdout and stderr belong to annotations and notifications; without a
    // log file, logs are dropped.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.codesense/logs/codesense.log
    if let Some(config_path) = codesense_config::config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("codesense.log"));
    }

    // Fallback: ./.codesense/logs/codesense.log
    candidates.push(PathBuf::from(".codesense").join("logs").join("codesense.log"));

    candidates
}

fn load_config(path: Option<&PathBuf>) -> Result<CodesenseConfig> {
    match path {
        Some(path) => CodesenseConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(CodesenseConfig::load()?.unwrap_or_default()),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_ref())?;
    let mut session = Session::from_config(&config).context("creating session")?;

    let code = match cli.command {
        Commands::Check { files } => {
            let mut host = TerminalHost::stdio();
            commands::check(&mut session, &mut host, &files).await
        }
        Commands::Fix { file, output } => {
            let mut host = TerminalHost::stdio().with_untitled_path(output);
            let mut quiet_host = TerminalHost::new(io::stderr(), io::stderr());
            commands::fix(&mut session, &mut host, &mut quiet_host, &file).await
        }
        Commands::Watch { files, interval_ms } => {
            let mut host = TerminalHost::stdio();
            let interval = Duration::from_millis(interval_ms.max(1));
            commands::watch(&mut session, &mut host, &files, interval).await?
        }
    };

    Ok(code)
}
