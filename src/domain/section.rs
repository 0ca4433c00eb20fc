//! Section - Independently Saveable Configuration Domains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A named configuration domain on the settings page
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    /// How delivered builds are previewed
    PreviewStrategy,
    /// Template selected for new projects
    TemplatesDefault,
    /// Per-stage service level targets (one row per pipeline stage)
    SlaConfig,
    /// Quality gate score thresholds
    Thresholds,
    /// Human-in-the-loop approval gates
    HitlGates,
}

/// Order in which dirty sections are committed by a save-all run.
///
/// Later sections may depend on earlier ones being stored first; keep this
/// order stable.
pub const SAVE_ORDER: [SectionKey; 5] = [
    SectionKey::PreviewStrategy,
    SectionKey::TemplatesDefault,
    SectionKey::SlaConfig,
    SectionKey::Thresholds,
    SectionKey::HitlGates,
];

impl SectionKey {
    /// Config API key for this section
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::PreviewStrategy => "preview_strategy",
            SectionKey::TemplatesDefault => "templates_default",
            SectionKey::SlaConfig => "sla_config",
            SectionKey::Thresholds => "thresholds",
            SectionKey::HitlGates => "hitl_gates",
        }
    }

    /// Human-readable section title for banners
    pub fn label(&self) -> &'static str {
        match self {
            SectionKey::PreviewStrategy => "Preview strategy",
            SectionKey::TemplatesDefault => "Default template",
            SectionKey::SlaConfig => "SLA configuration",
            SectionKey::Thresholds => "Quality thresholds",
            SectionKey::HitlGates => "Approval gates",
        }
    }

    /// Whether the section is stored as one row per pipeline stage instead
    /// of a single versioned config value
    pub fn is_row_backed(&self) -> bool {
        matches!(self, SectionKey::SlaConfig)
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SAVE_ORDER
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::Invalid {
                message: format!("Unknown config section: {s}"),
            })
    }
}
