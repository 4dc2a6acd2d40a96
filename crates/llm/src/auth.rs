//! Token Sources
//!
//! Bearer-token acquisition for the inference endpoint. A static API key is
//! used as-is; a token endpoint is called lazily and its token is cached for
//! the lifetime of the process, refreshed shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::types::{InferenceError, InferenceResult};

/// Refresh a cached token this long before its stated expiry.
const REFRESH_SKEW: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token endpoint does not state one.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(300);

/// Longest lifetime honoured from an endpoint, whatever it states.
const MAX_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Supplies the bearer token for one inference call.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid token, acquiring one if needed.
    async fn token(&self) -> InferenceResult<String>;
}

/// A fixed API key.
pub struct StaticToken {
    key: String,
}

impl StaticToken {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> InferenceResult<String> {
        if self.key.trim().is_empty() {
            return Err(InferenceError::auth("API key is empty"));
        }
        Ok(self.key.clone())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Token fetched from an issuing endpoint and cached until near expiry.
pub struct CachedTokenSource {
    client: reqwest::Client,
    endpoint: String,
    credential: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl CachedTokenSource {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            credential,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> InferenceResult<CachedToken> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(credential) = &self.credential {
            request = request.header("Authorization", format!("Bearer {}", credential));
        }

        let response = request.send().await.map_err(|e| {
            InferenceError::auth(format!("token endpoint unreachable: {}", e))
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            InferenceError::auth(format!("token endpoint body unreadable: {}", e))
        })?;
        if !(200..300).contains(&status) {
            return Err(InferenceError::auth(format!(
                "token endpoint returned HTTP {}",
                status
            )));
        }

        let (value, ttl) = parse_token_response(&body)?;
        Ok(CachedToken {
            value,
            expires_at: expiry_from(Instant::now(), ttl),
        })
    }
}

#[async_trait]
impl TokenSource for CachedTokenSource {
    async fn token(&self) -> InferenceResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if is_fresh(token.expires_at, Instant::now(), REFRESH_SKEW) {
                return Ok(token.value.clone());
            }
            debug!("cached access token near expiry, refreshing");
        }

        match self.fetch().await {
            Ok(token) => {
                let value = token.value.clone();
                *cached = Some(token);
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "access token acquisition failed");
                *cached = None;
                Err(e)
            }
        }
    }
}

/// Whether a token expiring at `expires_at` may still be used at `now`.
fn is_fresh(expires_at: Instant, now: Instant, skew: Duration) -> bool {
    now.checked_add(skew).is_some_and(|limit| limit < expires_at)
}

fn expiry_from(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_TOKEN_TTL)).unwrap_or(now)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(alias = "token", alias = "accessToken")]
    access_token: Option<String>,
    #[serde(alias = "expiresIn")]
    expires_in: Option<u64>,
}

/// Extract the token and its lifetime from an issuing endpoint's JSON body.
fn parse_token_response(body: &str) -> InferenceResult<(String, Duration)> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::auth(format!("token response is not JSON: {}", e)))?;
    let value = parsed
        .access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| InferenceError::auth("token response carries no access token"))?;
    let ttl = parsed
        .expires_in
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL)
        .min(MAX_TOKEN_TTL);
    Ok((value, ttl))
}
