//! Cross-Platform Path Utilities
//!
//! Functions for resolving the application directory (~/.assay/).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Assay directory (~/.assay/)
pub fn assay_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".assay"))
}

/// Get the config file path (~/.assay/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(assay_dir()?.join("config.json"))
}

/// Default directory for per-target result files (~/.assay/results/)
pub fn results_dir() -> AppResult<PathBuf> {
    Ok(assay_dir()?.join("results"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
