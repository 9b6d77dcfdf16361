//! Configuration file loading for codesense.
//!
//! The file lives at `~/.codesense/config.toml`; a missing file means
//! defaults everywhere. String values support `${VAR}` expansion, and
//! `OLLAMA_HOST` overrides the LLM base URL.

use std::path::{Path, PathBuf};
use std::{env, fs};

use codesense_lint::AnalyzerConfig;
use codesense_providers::LlmConfig;
use serde::Deserialize;
use thiserror::Error;

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

#[derive(Debug, Default, Deserialize)]
pub struct CodesenseConfig {
    pub analyzer: Option<AnalyzerConfig>,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Expand `${VAR}` references from the process environment.
///
/// Unset variables expand to the empty string; an unclosed `${` is kept as-is.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl CodesenseConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config = Self::parse(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Analyzer settings with environment references expanded.
    #[must_use]
    pub fn analyzer(&self) -> AnalyzerConfig {
        self.analyzer
            .clone()
            .unwrap_or_default()
            .map_strings(expand_env_vars)
    }

    /// LLM settings with environment references expanded and `OLLAMA_HOST` applied.
    #[must_use]
    pub fn llm(&self) -> LlmConfig {
        self.llm_with_host(env::var(OLLAMA_HOST_ENV).ok().as_deref())
    }

    fn llm_with_host(&self, host_override: Option<&str>) -> LlmConfig {
        let base = self.llm.clone().unwrap_or_default();
        let base_url = match host_override.map(str::trim) {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => expand_env_vars(base.base_url()),
        };
        let model = expand_env_vars(base.model());
        base.with_base_url(&base_url).with_model(model)
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".codesense").join("config.toml"))
}
