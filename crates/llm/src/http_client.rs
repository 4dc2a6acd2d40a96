//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with proxy and
//! timeout settings.

use std::time::Duration;

use assay_core::proxy::ProxyConfig;
use assay_core::{CoreError, CoreResult};

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
pub fn build_http_client(
    proxy: Option<&ProxyConfig>,
    request_timeout: Duration,
) -> CoreResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(request_timeout)
        .connect_timeout(request_timeout.min(Duration::from_secs(10)));
    match proxy {
        Some(cfg) => {
            let url = cfg.url();
            let mut p = reqwest::Proxy::all(&url)
                .map_err(|e| CoreError::config(format!("invalid proxy URL {}: {}", url, e)))?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder
        .build()
        .map_err(|e| CoreError::config(format!("failed to build HTTP client: {}", e)))
}
