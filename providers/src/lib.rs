//! Local LLM client for fix generation.
//!
//! Talks to an Ollama server over its non-streaming chat endpoint
//! (`POST {base_url}/api/chat`). One request carries one user message and the
//! reply is the assistant message's text.
//!
//! - [`OllamaClient::chat`] - send messages, get the assistant reply
//! - [`fix::generate_fixed_code`] - build the fix prompt and return the model's code
//!
//! # Error Handling
//!
//! Every failure is a [`ChatError`]. Transport errors are retried per
//! [`retry::RetryConfig`]; HTTP errors carry the server's `error` message when
//! the body has one.

pub mod fix;
pub mod retry;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use retry::{RetryConfig, RetryOutcome, send_with_retry};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "codellama";
/// Local models can take minutes on CPU for a whole file.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 2;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// LLM connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: RetryConfig::default().max_retries,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Accepts either a full URL or a bare `host:port` (as `OLLAMA_HOST` allows).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim();
        self.base_url = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to LLM failed after {attempts} attempt(s): {source}")]
    Connection {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("LLM returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("decoding LLM response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// Client for one Ollama server and model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    retry: RetryConfig,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ChatError> {
        let http = base_client_builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(ChatError::Client)?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/chat", config.base_url().trim_end_matches('/')),
            model: config.model().to_string(),
            retry: RetryConfig {
                max_retries: config.max_retries(),
                ..RetryConfig::default()
            },
        })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `messages` and return the assistant's reply.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ChatError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat request");

        let outcome = send_with_retry(|| self.http.post(&self.endpoint).json(&body), &self.retry).await;
        let response = match outcome {
            RetryOutcome::Success(response) => response,
            RetryOutcome::HttpError(response) => {
                let status = response.status().as_u16();
                let body = read_capped_error_body(response).await;
                let message = extract_error_message(&body);
                tracing::warn!(status, "LLM request failed: {message}");
                return Err(ChatError::Status { status, message });
            }
            RetryOutcome::ConnectionError { attempts, source } => {
                return Err(ChatError::Connection { attempts, source });
            }
        };

        let parsed: ChatResponse = response.json().await.map_err(ChatError::Decode)?;
        parsed.message.ok_or(ChatError::EmptyResponse)
    }
}

fn base_client_builder() -> reqwest::ClientBuilder {
    // Plain http is allowed: the server is normally on localhost.
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

async fn read_capped_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        })
}
