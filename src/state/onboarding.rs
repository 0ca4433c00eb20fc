//! Onboarding - Client Onboarding Completion Tracker
//!
//! Tracks which required fields of the client onboarding form are filled,
//! per step and overall, and gates submission on completeness.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Ordered steps of the onboarding form
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Company,
    Project,
    Brand,
    Content,
    Launch,
}

impl OnboardingStep {
    /// Steps in the order the client fills them
    pub const ALL: [OnboardingStep; 5] = [
        OnboardingStep::Company,
        OnboardingStep::Project,
        OnboardingStep::Brand,
        OnboardingStep::Content,
        OnboardingStep::Launch,
    ];

    /// Fields that must be filled before the form can be submitted
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            OnboardingStep::Company => &["company_name", "contact_name", "contact_email"],
            OnboardingStep::Project => &["project_name", "project_type", "pages"],
            OnboardingStep::Brand => &["primary_color", "logo_url"],
            OnboardingStep::Content => &["content_source", "copy_ready"],
            OnboardingStep::Launch => &["target_launch_date", "domain_name"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OnboardingStep::Company => "company",
            OnboardingStep::Project => "project",
            OnboardingStep::Brand => "brand",
            OnboardingStep::Content => "content",
            OnboardingStep::Launch => "launch",
        }
    }
}

/// Progress of a single step
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Complete,
}

/// Completion tracker for one client's onboarding form
#[derive(Clone, Debug, Default)]
pub struct OnboardingTracker {
    values: HashMap<&'static str, Value>,
    submitted: bool,
}

impl OnboardingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value; unknown fields for the step are rejected
    pub fn set_field(&mut self, step: OnboardingStep, field: &str, value: Value) -> Result<()> {
        let Some(name) = step.required_fields().iter().find(|f| **f == field) else {
            return Err(Error::Invalid {
                message: format!("Unknown onboarding field {field} for step {}", step.as_str()),
            });
        };
        self.values.insert(*name, value);
        Ok(())
    }

    /// Current value of a field
    pub fn field(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    fn is_filled(&self, field: &str) -> bool {
        self.values.get(field).is_some_and(is_filled)
    }

    pub fn step_status(&self, step: OnboardingStep) -> StepStatus {
        let fields = step.required_fields();
        let filled = fields.iter().filter(|f| self.is_filled(f)).count();
        match filled {
            0 => StepStatus::NotStarted,
            n if n == fields.len() => StepStatus::Complete,
            _ => StepStatus::InProgress,
        }
    }

    /// Percentage of required fields filled, rounded down
    pub fn completion_percent(&self) -> u8 {
        let (filled, total) = OnboardingStep::ALL.iter().fold((0usize, 0usize), |(f, t), step| {
            let fields = step.required_fields();
            (
                f + fields.iter().filter(|name| self.is_filled(name)).count(),
                t + fields.len(),
            )
        });
        if total == 0 {
            return 100;
        }
        u8::try_from(filled * 100 / total).unwrap_or(100)
    }

    /// First step that is not complete
    pub fn next_incomplete_step(&self) -> Option<OnboardingStep> {
        OnboardingStep::ALL
            .iter()
            .copied()
            .find(|step| self.step_status(*step) != StepStatus::Complete)
    }

    /// Required fields still empty, in form order
    pub fn missing_fields(&self) -> Vec<(OnboardingStep, &'static str)> {
        OnboardingStep::ALL
            .iter()
            .flat_map(|step| step.required_fields().iter().map(move |f| (*step, *f)))
            .filter(|(_, field)| !self.is_filled(field))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.next_incomplete_step().is_none()
    }

    /// Mark the form submitted; fails until every step is complete
    pub fn submit(&mut self) -> Result<()> {
        if let Some(step) = self.next_incomplete_step() {
            return Err(Error::Invalid {
                message: format!("Onboarding step {} is incomplete", step.as_str()),
            });
        }
        self.submitted = true;
        tracing::info!("Onboarding form submitted");
        Ok(())
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fill_step(tracker: &mut OnboardingTracker, step: OnboardingStep) {
        for field in step.required_fields() {
            tracker.set_field(step, field, json!("x")).expect("known field");
        }
    }

    #[test]
    fn empty_form_reports_zero() {
        let tracker = OnboardingTracker::new();
        assert_eq!(tracker.completion_percent(), 0);
        assert_eq!(tracker.next_incomplete_step(), Some(OnboardingStep::Company));
        assert_eq!(tracker.step_status(OnboardingStep::Brand), StepStatus::NotStarted);
    }

    #[test]
    fn partial_step_is_in_progress() {
        let mut tracker = OnboardingTracker::new();
        tracker
            .set_field(OnboardingStep::Company, "company_name", json!("Acme"))
            .expect("set");
        tracker
            .set_field(OnboardingStep::Company, "contact_name", json!("   "))
            .expect("set");

        assert_eq!(tracker.step_status(OnboardingStep::Company), StepStatus::InProgress);
        // 1 of 12 required fields
        assert_eq!(tracker.completion_percent(), 8);
        assert_eq!(
            tracker.missing_fields().first(),
            Some(&(OnboardingStep::Company, "contact_name"))
        );
    }

    #[test]
    fn empty_collections_do_not_count() {
        let mut tracker = OnboardingTracker::new();
        tracker
            .set_field(OnboardingStep::Project, "pages", json!([]))
            .expect("set");
        assert!(tracker.missing_fields().contains(&(OnboardingStep::Project, "pages")));

        tracker
            .set_field(OnboardingStep::Content, "copy_ready", json!(false))
            .expect("set");
        assert!(!tracker
            .missing_fields()
            .contains(&(OnboardingStep::Content, "copy_ready")));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut tracker = OnboardingTracker::new();
        let err = tracker
            .set_field(OnboardingStep::Brand, "company_name", json!("Acme"))
            .expect_err("wrong step");
        assert!(err.to_string().contains("company_name"));
    }

    #[test]
    fn submit_requires_every_step() {
        let mut tracker = OnboardingTracker::new();
        for step in &OnboardingStep::ALL[..4] {
            fill_step(&mut tracker, *step);
        }
        let err = tracker.submit().expect_err("launch step missing");
        assert!(err.to_string().contains("launch"));
        assert!(!tracker.is_submitted());

        fill_step(&mut tracker, OnboardingStep::Launch);
        tracker.submit().expect("complete form");
        assert!(tracker.is_submitted());
        assert_eq!(tracker.completion_percent(), 100);
    }
}
