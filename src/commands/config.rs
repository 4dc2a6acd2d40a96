//! Config Command

use crate::storage::config::ConfigService;
use crate::utils::error::AppResult;

/// Effective configuration as pretty JSON, secrets redacted
pub fn show_config(service: &ConfigService) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(
        &service.get_config().redacted(),
    )?)
}

/// Write defaults to the config path if no file exists there
pub fn init_config(service: &ConfigService) -> AppResult<bool> {
    service.write_defaults()
}
