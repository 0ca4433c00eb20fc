//! Error types for Delivery Console
//!
//! Centralized error handling using snafu. Section saves map every failure
//! onto one of four user-facing kinds, see [`FailureKind`].

use crate::domain::{Role, SectionKey};
use snafu::Snafu;

/// Main error type for the application
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (file operations)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },

    /// A section value failed its local validator
    #[snafu(display("{section}: {message}"))]
    Validation { section: SectionKey, message: String },

    /// The session role may not persist this section
    #[snafu(display("{role} is not allowed to change {section}"))]
    Unauthorized { section: SectionKey, role: Role },

    /// Optimistic-concurrency mismatch reported by the server
    #[snafu(display("Version conflict on {key}"))]
    Conflict { key: String },

    /// Any other network or server failure
    #[snafu(display("{message}"))]
    Transport { message: String },

    /// A save run is already in flight
    #[snafu(display("A save is already in progress"))]
    SaveInProgress,

    /// Timeout error
    #[snafu(display("Timeout: {message}"))]
    Timeout { message: String },
}

/// Failure classes surfaced to the user when a section save stops
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Local validator rejected the value; nothing was sent
    Validation,
    /// Role check failed; nothing was sent
    Authorization,
    /// Server version no longer matches
    Conflict,
    /// Everything else
    Transport,
}

impl Error {
    /// Classify this error for section-save reporting
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Validation { .. } => FailureKind::Validation,
            Error::Unauthorized { .. } => FailureKind::Authorization,
            Error::Conflict { .. } => FailureKind::Conflict,
            _ => FailureKind::Transport,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Error::Timeout {
                message: source.to_string(),
            }
        } else {
            Error::Transport {
                message: source.to_string(),
            }
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;
