//! Inference Client Trait
//!
//! Defines the port through which the analysis pipeline reaches the external
//! model, plus the client factory and HTTP status classification.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::auth::{CachedTokenSource, StaticToken, TokenSource};
use super::http_client::build_http_client;
use super::openai::OpenAiCompatibleClient;
use super::types::{AnalysisRequest, InferenceError, InferenceResult, ProviderConfig};
use assay_core::CoreResult;

/// Trait that every inference backend implements.
///
/// A single call either returns the model's raw reply text or fails with
/// exactly one `InferenceError`. Implementations never retry.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Returns the client name for identification in logs.
    fn name(&self) -> &'static str;

    /// Send one analysis request and return the raw reply text.
    async fn complete(&self, request: &AnalysisRequest) -> InferenceResult<String>;
}

/// Client used when inference is switched off or no credentials exist.
///
/// Every call fails with `AuthFailure`, which routes the analyzer straight to
/// the heuristic engine.
#[derive(Debug, Default)]
pub struct DisabledClient {
    reason: String,
}

impl DisabledClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl InferenceClient for DisabledClient {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn complete(&self, _request: &AnalysisRequest) -> InferenceResult<String> {
        Err(InferenceError::auth(format!(
            "inference disabled: {}",
            if self.reason.is_empty() {
                "no credentials configured"
            } else {
                self.reason.as_str()
            }
        )))
    }
}

/// Build the inference client described by `config`.
///
/// A static API key wins over a token endpoint; with neither configured the
/// result is a `DisabledClient`.
pub fn build_inference_client(config: &ProviderConfig) -> CoreResult<Arc<dyn InferenceClient>> {
    if !config.has_credentials() {
        info!("no inference credentials configured, using heuristic analysis only");
        return Ok(Arc::new(DisabledClient::new("no credentials configured")));
    }

    let http = build_http_client(
        config.proxy.as_ref(),
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let tokens: Arc<dyn TokenSource> = match (&config.api_key, &config.token_endpoint) {
        (Some(key), _) if !key.trim().is_empty() => Arc::new(StaticToken::new(key.clone())),
        (_, Some(endpoint)) => Arc::new(CachedTokenSource::new(
            http.clone(),
            endpoint.clone(),
            config.token_credential.clone(),
        )),
        _ => return Ok(Arc::new(DisabledClient::new("no credentials configured"))),
    };

    Ok(Arc::new(OpenAiCompatibleClient::new(config.clone(), http, tokens)))
}

/// Classify a non-success HTTP status from the inference endpoint.
pub fn parse_http_error(status: u16, body: &str, client: &str) -> InferenceError {
    let snippet: String = body.chars().take(300).collect();
    match status {
        401 => InferenceError::AuthFailure {
            message: format!("{}: credentials rejected", client),
        },
        403 => InferenceError::AuthFailure {
            message: format!("{}: access denied", client),
        },
        408 | 504 => InferenceError::TransportFailure {
            message: format!("{}: HTTP {} {}", client, status, snippet),
        },
        _ => InferenceError::ServiceError {
            status: Some(status),
            message: snippet,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_fails_with_auth() {
        let client = DisabledClient::new("offline run");
        let request = AnalysisRequest::new("prompt", 0.1, 100);
        match client.complete(&request).await {
            Err(InferenceError::AuthFailure { message }) => {
                assert!(message.contains("offline run"));
            }
            other => panic!("Expected AuthFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_factory_without_credentials_is_disabled() {
        let client = build_inference_client(&ProviderConfig::default()).unwrap();
        assert_eq!(client.name(), "disabled");
    }

    #[test]
    fn test_factory_with_api_key() {
        let config = ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = build_inference_client(&config).unwrap();
        assert_eq!(client.name(), "openai_compatible");
    }

    #[test]
    fn test_parse_http_error() {
        let err = parse_http_error(401, "unauthorized", "openai_compatible");
        assert!(matches!(err, InferenceError::AuthFailure { .. }));

        let err = parse_http_error(403, "forbidden", "openai_compatible");
        assert!(matches!(err, InferenceError::AuthFailure { .. }));

        let err = parse_http_error(429, "rate limited", "openai_compatible");
        assert!(matches!(
            err,
            InferenceError::ServiceError {
                status: Some(429),
                ..
            }
        ));

        let err = parse_http_error(504, "gateway timeout", "openai_compatible");
        assert!(matches!(err, InferenceError::TransportFailure { .. }));

        let err = parse_http_error(500, "internal error", "openai_compatible");
        assert!(matches!(err, InferenceError::ServiceError { .. }));
    }
}
