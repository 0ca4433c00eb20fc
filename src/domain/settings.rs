//! Settings - Typed Shapes of Section Values
//!
//! The editor stores raw JSON; these structs describe what the API sends and
//! provide the values used when a section has never been configured.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::section::SectionKey;

/// Preview delivery modes accepted by the backend
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStrategy {
    /// Ship the build as a zip archive only
    #[default]
    ZipOnly,
    /// Also host a static preview site
    ServeStaticPreview,
}

impl PreviewStrategy {
    /// All accepted wire values, in display order
    pub const ALLOWED: [&'static str; 2] = ["zip_only", "serve_static_preview"];

    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewStrategy::ZipOnly => "zip_only",
            PreviewStrategy::ServeStaticPreview => "serve_static_preview",
        }
    }
}

/// A project template registered on the server
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TemplateSummary {
    /// Template identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
}

impl TemplateSummary {
    /// Create a template entry
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// SLA targets for one pipeline stage (one persisted row)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlaStage {
    /// Pipeline stage name (e.g. "BUILD")
    pub stage: String,
    /// Expected duration in days
    pub default_days: f64,
    /// Days after which the stage is flagged amber
    pub warning_threshold_days: f64,
    /// Days after which the stage is flagged red
    pub critical_threshold_days: f64,
}

impl SlaStage {
    /// Whether every day count is a finite, non-negative number
    pub fn has_valid_days(&self) -> bool {
        [
            self.default_days,
            self.warning_threshold_days,
            self.critical_threshold_days,
        ]
        .iter()
        .all(|days| days.is_finite() && *days >= 0.0)
    }
}

/// Quality gate thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub build_pass_score: f64,
    pub qa_pass_score: f64,
    pub axe_max_critical: f64,
    pub lighthouse_min_performance: f64,
    pub lighthouse_min_accessibility: f64,
    pub lighthouse_min_best_practices: f64,
    pub lighthouse_min_seo: f64,
}

impl Thresholds {
    /// Field names in display order
    pub const FIELDS: [&'static str; 7] = [
        "build_pass_score",
        "qa_pass_score",
        "axe_max_critical",
        "lighthouse_min_performance",
        "lighthouse_min_accessibility",
        "lighthouse_min_best_practices",
        "lighthouse_min_seo",
    ];

    /// Fields that must also be non-negative
    pub const NON_NEGATIVE_FIELDS: [&'static str; 3] =
        ["build_pass_score", "qa_pass_score", "axe_max_critical"];
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            build_pass_score: 80.0,
            qa_pass_score: 80.0,
            axe_max_critical: 0.0,
            lighthouse_min_performance: 90.0,
            lighthouse_min_accessibility: 90.0,
            lighthouse_min_best_practices: 90.0,
            lighthouse_min_seo: 90.0,
        }
    }
}

/// Human-in-the-loop approval gates
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitlGates {
    /// Require sign-off on the intake brief
    pub intake_approval: bool,
    /// Require sign-off on the design proposal
    pub design_approval: bool,
    /// Require review of the built site before QA
    pub build_review: bool,
    /// Require approval before the client receives the delivery
    pub delivery_approval: bool,
}

/// Value a section starts from when the server has nothing stored
pub fn default_value(section: SectionKey) -> Value {
    match section {
        SectionKey::PreviewStrategy => json!(PreviewStrategy::default().as_str()),
        SectionKey::TemplatesDefault => json!(""),
        SectionKey::SlaConfig => json!([]),
        SectionKey::Thresholds => serde_json::to_value(Thresholds::default()).unwrap_or(Value::Null),
        SectionKey::HitlGates => serde_json::to_value(HitlGates::default()).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SAVE_ORDER;

    #[test]
    fn defaults_are_never_null() {
        for section in SAVE_ORDER {
            assert!(!default_value(section).is_null(), "{section}");
        }
    }

    #[test]
    fn default_thresholds_have_all_fields() {
        let value = default_value(SectionKey::Thresholds);
        for field in Thresholds::FIELDS {
            assert!(value.get(field).is_some_and(Value::is_number), "{field}");
        }
    }

    #[test]
    fn sla_stage_parses_from_row() {
        let row = json!({
            "stage": "QA",
            "default_days": 2,
            "warning_threshold_days": 3,
            "critical_threshold_days": 5
        });
        let stage: SlaStage = serde_json::from_value(row).expect("parse row");
        assert_eq!(stage.stage, "QA");
        assert_eq!(stage.critical_threshold_days, 5.0);
        assert!(stage.has_valid_days());

        let negative = SlaStage {
            warning_threshold_days: -1.0,
            ..stage
        };
        assert!(!negative.has_valid_days());
    }
}
