//! Validation - Per-Section Save-Time Checks
//!
//! Each validator is a pure function returning at most one message. They run
//! only when a save is attempted so typing is never interrupted.

use serde_json::Value;

use crate::domain::{PreviewStrategy, SectionKey, SlaStage, TemplateSummary, Thresholds};

/// Data the validators check values against
#[derive(Clone, Debug, Default)]
pub struct ValidationContext {
    /// Templates currently registered on the server
    pub templates: Vec<TemplateSummary>,
}

impl ValidationContext {
    /// Context with the given template registry
    pub fn with_templates(templates: Vec<TemplateSummary>) -> Self {
        Self { templates }
    }

    fn has_template(&self, id: &str) -> bool {
        self.templates.iter().any(|t| t.id == id)
    }
}

/// Validate a section value, returning the error message if it is rejected
pub fn validate(section: SectionKey, value: &Value, context: &ValidationContext) -> Option<String> {
    match section {
        SectionKey::PreviewStrategy => validate_preview_strategy(value),
        SectionKey::TemplatesDefault => validate_default_template(value, context),
        SectionKey::SlaConfig => validate_sla(value),
        SectionKey::Thresholds => validate_thresholds(value),
        SectionKey::HitlGates => None,
    }
}

/// The strategy must be one of [`PreviewStrategy::ALLOWED`]
pub fn validate_preview_strategy(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if PreviewStrategy::ALLOWED.contains(&s) => None,
        _ => Some(format!(
            "Preview strategy must be one of: {}",
            PreviewStrategy::ALLOWED.join(", ")
        )),
    }
}

/// An empty selection means "no default template"
pub fn validate_default_template(value: &Value, context: &ValidationContext) -> Option<String> {
    let id = match value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.as_str(),
        _ => return Some("Default template must be a template id".to_string()),
    };

    if context.has_template(id) {
        None
    } else {
        Some(format!("Default template \"{id}\" must exist in the registry"))
    }
}

/// Every row must name its stage and parse as an [`SlaStage`] with
/// non-negative day counts. The first offending row is reported.
pub fn validate_sla(value: &Value) -> Option<String> {
    let Some(rows) = value.as_array() else {
        return Some("SLA configuration must be a list of stages".to_string());
    };

    rows.iter().enumerate().find_map(|(index, row)| {
        let Some(name) = row
            .get("stage")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
        else {
            return Some(format!("SLA row #{} must name its stage", index + 1));
        };

        match serde_json::from_value::<SlaStage>(row.clone()) {
            Ok(stage) if stage.has_valid_days() => None,
            _ => Some(format!("SLA values for {name} must be non-negative numbers")),
        }
    })
}

/// All seven thresholds must be numbers; build, QA and axe limits must
/// also be non-negative
pub fn validate_thresholds(value: &Value) -> Option<String> {
    if let Some(field) = Thresholds::FIELDS
        .iter()
        .find(|field| finite_number(value.get(**field)).is_none())
    {
        return Some(format!("Threshold {field} must be a number"));
    }

    Thresholds::NON_NEGATIVE_FIELDS
        .iter()
        .find(|field| !non_negative_number(value.get(**field)))
        .map(|field| format!("Threshold {field} must not be negative"))
}

fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

fn non_negative_number(value: Option<&Value>) -> bool {
    finite_number(value).is_some_and(|n| n >= 0.0)
}
