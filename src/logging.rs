//! Logging
//!
//! Installs the global tracing subscriber. Filter directives come from
//! `ASSAY_LOG` (default `info`); `ASSAY_LOG_JSON=1` switches to JSON lines.
//! Output goes to stderr so stdout carries only the report.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding filter directives
pub const ENV_LOG: &str = "ASSAY_LOG";
/// Environment variable enabling JSON output
pub const ENV_LOG_JSON: &str = "ASSAY_LOG_JSON";

/// Parse a boolean-ish environment value
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Build the filter from `ASSAY_LOG`, raised to `debug` when `verbose`.
fn build_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the subscriber. Calling it twice is a no-op.
pub fn init_tracing(verbose: bool) {
    let filter = build_filter(verbose);
    let json = parse_flag(std::env::var(ENV_LOG_JSON).ok().as_deref());

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
