//! Inference Types
//!
//! Request, configuration, and error types for the inference boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use assay_core::proxy::ProxyConfig;

/// Default chat-completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One analysis request as sent to the model.
///
/// Built by the prompt builder, consumed by exactly one `complete` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Full prompt text
    pub prompt_text: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Output-size cap in tokens
    pub max_output_tokens: u32,
}

impl AnalysisRequest {
    /// Create a new request
    pub fn new(prompt_text: impl Into<String>, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            temperature,
            max_output_tokens,
        }
    }

    /// Check the request against the client's size constraints.
    pub fn validate(&self, max_prompt_chars: usize) -> InferenceResult<()> {
        if self.prompt_text.trim().is_empty() {
            return Err(InferenceError::InvalidRequest {
                message: "prompt text is empty".to_string(),
            });
        }
        let chars = self.prompt_text.chars().count();
        if chars > max_prompt_chars {
            return Err(InferenceError::InvalidRequest {
                message: format!(
                    "prompt text has {} chars, limit is {}",
                    chars, max_prompt_chars
                ),
            });
        }
        if self.max_output_tokens == 0 {
            return Err(InferenceError::InvalidRequest {
                message: "maxOutputTokens must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the inference endpoint.
///
/// Passed explicitly to the client constructor; there is no process-wide
/// client instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Static API key. Takes precedence over `token_endpoint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint that issues short-lived access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// Credential presented to the token endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_credential: Option<String>,
    /// Chat-completions URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Upper bound on prompt size accepted by the client
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Optional outbound proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_prompt_chars() -> usize {
    120_000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            token_endpoint: None,
            token_credential: None,
            base_url: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
            max_prompt_chars: default_max_prompt_chars(),
            proxy: None,
        }
    }
}

impl ProviderConfig {
    /// Whether any credential source is configured.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
            || self
                .token_endpoint
                .as_deref()
                .is_some_and(|e| !e.trim().is_empty())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("requestTimeoutSecs must be positive".to_string());
        }
        if self.max_prompt_chars == 0 {
            return Err("maxPromptChars must be positive".to_string());
        }
        for (label, value) in [
            ("baseUrl", self.base_url.as_deref()),
            ("tokenEndpoint", self.token_endpoint.as_deref()),
        ] {
            if let Some(raw) = value {
                url::Url::parse(raw).map_err(|e| format!("{} is not a valid URL: {}", label, e))?;
            }
        }
        if let Some(proxy) = &self.proxy {
            proxy.validate()?;
        }
        Ok(())
    }

    /// Copy of this config with secrets blanked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_key.is_some() {
            copy.api_key = Some("***".to_string());
        }
        if copy.token_credential.is_some() {
            copy.token_credential = Some("***".to_string());
        }
        copy
    }
}

/// Failure kinds of a single inference attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Credentials missing, rejected, or token acquisition failed
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    /// Timeout, connection reset, or run cancellation
    #[error("Transport failure: {message}")]
    TransportFailure { message: String },

    /// Non-success status or an undecodable response envelope
    #[error("Service error{}: {message}", status_suffix(.status))]
    ServiceError {
        status: Option<u16>,
        message: String,
    },

    /// The service answered but produced no text
    #[error("Empty response from inference service")]
    EmptyResponse,

    /// The request violated the client's constraints and was never sent
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl InferenceError {
    /// Stable kind tag for logs and result records.
    pub fn kind(&self) -> InferenceErrorKind {
        match self {
            InferenceError::AuthFailure { .. } => InferenceErrorKind::AuthFailure,
            InferenceError::TransportFailure { .. } => InferenceErrorKind::TransportFailure,
            InferenceError::ServiceError { .. } => InferenceErrorKind::ServiceError,
            InferenceError::EmptyResponse => InferenceErrorKind::EmptyResponse,
            InferenceError::InvalidRequest { .. } => InferenceErrorKind::InvalidRequest,
        }
    }

    /// Create a transport failure
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure {
            message: msg.into(),
        }
    }

    /// Create an auth failure
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthFailure {
            message: msg.into(),
        }
    }
}

/// Serializable tag of an `InferenceError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InferenceErrorKind {
    AuthFailure,
    TransportFailure,
    ServiceError,
    EmptyResponse,
    InvalidRequest,
}

impl std::fmt::Display for InferenceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceErrorKind::AuthFailure => write!(f, "auth_failure"),
            InferenceErrorKind::TransportFailure => write!(f, "transport_failure"),
            InferenceErrorKind::ServiceError => write!(f, "service_error"),
            InferenceErrorKind::EmptyResponse => write!(f, "empty_response"),
            InferenceErrorKind::InvalidRequest => write!(f, "invalid_request"),
        }
    }
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;
