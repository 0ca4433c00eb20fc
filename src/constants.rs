//! Console Constants
//!
//! Centralized defaults and user-facing messages.

/// Application name used for directories and log files
pub const APP_NAME: &str = "delivery-console";

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable overriding the configured API base URL
pub const API_URL_ENV: &str = "DELIVERY_CONSOLE_API_URL";

/// Default API endpoint
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Job status polling
pub const POLL_INTERVAL_MS: u64 = 3000;
pub const POLL_BUDGET_SECS: u64 = 300;

/// Message recorded on a section whose save hit a version conflict
pub const CONFLICT_MESSAGE: &str =
    "This setting was changed by someone else. Reload the page to get the latest values, then save again.";
