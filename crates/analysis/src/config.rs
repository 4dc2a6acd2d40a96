//! Pipeline Configuration
//!
//! Tunables of the analysis run. Every field has a serde default so a partial
//! JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

/// Configuration of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Upper bound on targets analyzed at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Wall-clock budget of a run; in-flight inference calls are cancelled after it
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub request: RequestConfig,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_run_timeout() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            run_timeout_secs: default_run_timeout(),
            summary: SummaryConfig::default(),
            request: RequestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("maxConcurrency must be at least 1".to_string());
        }
        if self.run_timeout_secs == 0 {
            return Err("runTimeoutSecs must be positive".to_string());
        }
        self.summary.validate()?;
        self.request.validate()
    }
}

/// Digest bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryConfig {
    /// Per-field truncation length, in characters
    #[serde(default = "default_max_field_chars")]
    pub max_field_chars: usize,
    /// Records listed before the remainder is collapsed into one line
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_field_chars() -> usize {
    160
}

fn default_max_records() -> usize {
    200
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_field_chars: default_max_field_chars(),
            max_records: default_max_records(),
        }
    }
}

impl SummaryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_field_chars == 0 {
            return Err("summary.maxFieldChars must be positive".to_string());
        }
        if self.max_records == 0 {
            return Err("summary.maxRecords must be positive".to_string());
        }
        Ok(())
    }
}

/// Sampling parameters sent with each request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_output_tokens() -> u32 {
    4096
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl RequestConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "request.temperature must be within 0..=2, got {}",
                self.temperature
            ));
        }
        if self.max_output_tokens == 0 {
            return Err("request.maxOutputTokens must be positive".to_string());
        }
        Ok(())
    }
}
