//! Settings Models
//!
//! Application configuration stored in config.json.

use std::path::PathBuf;

use assay_analysis::PipelineConfig;
use assay_llm::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding `provider.apiKey`
pub const ENV_API_KEY: &str = "ASSAY_API_KEY";
/// Environment variable overriding `provider.baseUrl`
pub const ENV_BASE_URL: &str = "ASSAY_BASE_URL";
/// Environment variable overriding `provider.model`
pub const ENV_MODEL: &str = "ASSAY_MODEL";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Inference endpoint and credentials
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Analysis run tunables
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Directory for per-target result files; `~/.assay/results` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.provider
            .validate()
            .map_err(|e| format!("provider: {}", e))?;
        self.pipeline
            .validate()
            .map_err(|e| format!("pipeline: {}", e))?;
        Ok(())
    }

    /// Apply environment overrides. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = value(ENV_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = value(ENV_BASE_URL) {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = value(ENV_MODEL) {
            self.provider.model = model;
        }
    }

    /// Copy with secrets blanked, for display
    pub fn redacted(&self) -> Self {
        Self {
            provider: self.provider.redacted(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.provider.has_credentials());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"pipeline": {"maxConcurrency": 8}}"#).unwrap();
        assert_eq!(config.pipeline.max_concurrency, 8);
        assert_eq!(config.pipeline.run_timeout_secs, 120);
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_validation_prefixes_section() {
        let mut config = AppConfig::default();
        config.pipeline.max_concurrency = 0;
        assert!(config.validate().unwrap_err().starts_with("pipeline:"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-env"),
            (ENV_MODEL, "gpt-4.1"),
            (ENV_BASE_URL, "  "),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.provider.model, "gpt-4.1");
        assert!(config.provider.base_url.is_none());
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-secret".to_string());
        let json = serde_json::to_string(&config.redacted()).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
