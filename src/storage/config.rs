//! JSON Configuration Management
//!
//! Handles reading and writing the application configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for the effective app settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Without one, `~/.assay/config.json` is
    /// used when present and defaults otherwise. Environment overrides are
    /// applied last, then the result is validated.
    pub fn load(explicit: Option<&Path>) -> AppResult<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::not_found(format!(
                        "config file {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => config_path()?,
        };
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Load from `config_path` with a custom environment lookup
    pub fn load_with_env(
        config_path: PathBuf,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "loading config file");
            Self::load_from_file(&config_path)?
        } else {
            debug!(path = %config_path.display(), "no config file, using defaults");
            AppConfig::default()
        };
        config.apply_env(lookup);
        config.validate().map_err(AppError::validation)?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Path the configuration was (or would be) loaded from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Whether a config file exists at `config_path`
    pub fn file_exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Write a default configuration file unless one exists.
    ///
    /// Returns whether a file was written.
    pub fn write_defaults(&self) -> AppResult<bool> {
        if self.file_exists() {
            return Ok(false);
        }
        Self::save_to_file(&self.config_path, &AppConfig::default())?;
        Ok(true)
    }
}
