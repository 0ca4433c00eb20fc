//! Settings - Persisted Application Configuration
//!
//! `settings.toml` in the config directory. The API token is sealed on disk
//! and unsealed on load; `DELIVERY_CONSOLE_API_URL` overrides the base URL.

use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::constants::{API_URL_ENV, SETTINGS_FILE};
use crate::domain::config::AppConfig;
use crate::error::Result;
use crate::helpers::{get_or_create_config_dir, seal, unseal};

/// Path of the settings file, created empty if missing
pub fn settings_path() -> Result<PathBuf> {
    let path = get_or_create_config_dir()?.join(SETTINGS_FILE);
    if !path.exists() {
        std::fs::write(&path, "")?;
    }
    Ok(path)
}

/// Load settings from disk and apply environment overrides
pub fn load_settings() -> Result<AppConfig> {
    let path = settings_path()?;
    info!(path = ?path, "Loading settings file");
    let content = std::fs::read_to_string(&path)?;

    let config = parse_settings(&content).map_err(|e| {
        error!(error = %e, path = ?path, "Failed to parse settings file");
        e
    })?;
    Ok(apply_env_override(config, std::env::var(API_URL_ENV).ok()))
}

/// Write settings to disk with the token sealed
pub fn save_settings(config: &AppConfig) -> Result<()> {
    let path = settings_path()?;
    std::fs::write(&path, render_settings(config)?)?;
    info!(path = ?path, "Saved settings file");
    Ok(())
}

/// Parse settings content; empty content yields the defaults.
///
/// A token that cannot be unsealed is dropped with a warning.
pub fn parse_settings(content: &str) -> Result<AppConfig> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let mut config: AppConfig = toml::from_str(content)?;
    config.api.token = match config.api.token.take() {
        Some(sealed) if !sealed.is_empty() => match unseal(&sealed) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable API token");
                None
            }
        },
        _ => None,
    };
    Ok(config)
}

/// Serialize settings with the token sealed
pub fn render_settings(config: &AppConfig) -> Result<String> {
    let mut stored = config.clone();
    stored.api.token = match &config.api.token {
        Some(token) if !token.is_empty() => Some(seal(token)?),
        _ => None,
    };
    Ok(toml::to_string(&stored)?)
}

/// Override the API base URL when `value` is a non-empty string
pub fn apply_env_override(mut config: AppConfig, value: Option<String>) -> AppConfig {
    if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        info!("{} overrides API base URL", API_URL_ENV);
        config.api.base_url = url;
    }
    config
}
