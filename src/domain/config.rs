//! Config - Application Configuration

use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, POLL_BUDGET_SECS, POLL_INTERVAL_MS,
};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration API endpoint
    pub api: ApiConfig,
    /// Signed-in user
    pub session: SessionConfig,
    /// Job status polling
    pub polling: PollingConfig,
}

/// Configuration API connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL (e.g., "http://localhost:8080/api")
    pub base_url: String,
    /// Bearer token (sealed at rest)
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

/// Session identity
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// User name shown in logs
    pub user: String,
    /// Role used for section permission checks
    pub role: Role,
}

/// Bounded polling loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between two status fetches
    pub interval_ms: u64,
    /// Maximum wall-clock time spent polling one job
    pub budget_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: POLL_INTERVAL_MS,
            budget_secs: POLL_BUDGET_SECS,
        }
    }
}
