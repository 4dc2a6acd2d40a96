//! OpenAI-Compatible Client
//!
//! Implementation of the InferenceClient trait for any endpoint speaking the
//! chat-completions wire format (OpenAI, Azure-style gateways, local
//! servers). One request, one reply, no streaming and no retries.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::auth::TokenSource;
use super::provider::{parse_http_error, InferenceClient};
use super::types::{AnalysisRequest, InferenceError, InferenceResult, ProviderConfig, DEFAULT_BASE_URL};

/// System message sent with every analysis request
const SYSTEM_PROMPT: &str =
    "You are a meticulous software and operations auditor. Reply with a single JSON object.";

/// Chat-completions client
pub struct OpenAiCompatibleClient {
    config: ProviderConfig,
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl OpenAiCompatibleClient {
    /// Create a new client with an explicit configuration, HTTP client, and
    /// token source.
    pub fn new(config: ProviderConfig, client: reqwest::Client, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    /// Get the API URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Build the request body for the API
    fn build_request_body(&self, request: &AnalysisRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
            "stream": false,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": request.prompt_text },
            ],
        })
    }

    /// Pull the reply text out of a decoded response
    fn extract_text(response: &ChatResponse) -> InferenceResult<String> {
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(content)
    }
}

fn classify_transport_error(e: reqwest::Error) -> InferenceError {
    let what = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    InferenceError::transport(format!("{}: {}", what, e))
}

#[async_trait]
impl InferenceClient for OpenAiCompatibleClient {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    async fn complete(&self, request: &AnalysisRequest) -> InferenceResult<String> {
        request.validate(self.config.max_prompt_chars)?;
        let token = self.tokens.token().await?;

        let body = self.build_request_body(request);
        let started = Instant::now();

        let response = self
            .client
            .post(self.base_url())
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(classify_transport_error)?;

        debug!(
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = body_text.len(),
            model = %self.config.model,
            "inference call returned"
        );

        if !(200..300).contains(&status) {
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        if body_text.trim().is_empty() {
            return Err(InferenceError::EmptyResponse);
        }

        let decoded: ChatResponse =
            serde_json::from_str(&body_text).map_err(|e| InferenceError::ServiceError {
                status: Some(status),
                message: format!("undecodable response envelope: {}", e),
            })?;

        Self::extract_text(&decoded)
    }
}

/// Chat-completions response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
