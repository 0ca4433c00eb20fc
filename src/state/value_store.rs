//! ValueStore - Per-Section Editor State
//!
//! Holds the server baseline, the locally edited value, the dirty flag and
//! the last save errors for every configuration section. All mutation goes
//! through the methods below; dirtiness is recomputed synchronously on every
//! edit.

use serde_json::Value;
use std::collections::HashMap;

use super::change_tracker;
use crate::domain::{SAVE_ORDER, SectionKey};

/// Editor state of one section
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionState {
    initial_value: Option<Value>,
    current_value: Option<Value>,
    is_dirty: bool,
    validation_errors: Vec<String>,
    initialized: bool,
}

impl SectionState {
    /// Last value known to match the server
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial_value.as_ref()
    }

    /// Locally edited value
    pub fn current_value(&self) -> Option<&Value> {
        self.current_value.as_ref()
    }

    /// Whether the current value differs from the baseline
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// Errors from the last save attempt
    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    /// Whether the baseline has been loaded at least once
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Dirty and initialized
    pub fn is_eligible_for_save(&self) -> bool {
        self.is_dirty && self.initialized
    }
}

/// State of every section on the configuration page
#[derive(Clone, Debug)]
pub struct ValueStore {
    sections: HashMap<SectionKey, SectionState>,
}

impl ValueStore {
    /// Create a store with every section empty and uninitialized
    pub fn new() -> Self {
        Self {
            sections: SAVE_ORDER
                .iter()
                .map(|key| (*key, SectionState::default()))
                .collect(),
        }
    }

    // ==================== Getters ====================

    /// Full state of a section
    pub fn section(&self, section: SectionKey) -> &SectionState {
        // Every key is inserted in `new`, entries are never removed.
        &self.sections[&section]
    }

    /// Current value of a section
    pub fn current(&self, section: SectionKey) -> Option<&Value> {
        self.section(section).current_value()
    }

    /// Baseline value of a section
    pub fn initial(&self, section: SectionKey) -> Option<&Value> {
        self.section(section).initial_value()
    }

    /// Whether a section has unsaved edits
    pub fn is_dirty(&self, section: SectionKey) -> bool {
        self.section(section).is_dirty()
    }

    /// Whether a section's baseline has been loaded
    pub fn is_initialized(&self, section: SectionKey) -> bool {
        self.section(section).is_initialized()
    }

    /// Save errors recorded on a section
    pub fn errors(&self, section: SectionKey) -> &[String] {
        self.section(section).validation_errors()
    }

    /// Dirty sections in save order
    pub fn dirty_sections(&self) -> Vec<SectionKey> {
        SAVE_ORDER
            .iter()
            .copied()
            .filter(|key| self.is_dirty(*key))
            .collect()
    }

    /// Sections a save-all run would commit, in save order
    pub fn eligible_sections(&self) -> Vec<SectionKey> {
        SAVE_ORDER
            .iter()
            .copied()
            .filter(|key| self.section(*key).is_eligible_for_save())
            .collect()
    }

    /// Whether any section has unsaved edits
    pub fn has_unsaved_changes(&self) -> bool {
        self.sections.values().any(SectionState::is_dirty)
    }

    // ==================== Setters ====================

    fn entry(&mut self, section: SectionKey) -> &mut SectionState {
        self.sections.entry(section).or_default()
    }

    /// Set the baseline (and current value, defaulting to the baseline)
    pub fn set_initial(&mut self, section: SectionKey, initial: Value, current: Option<Value>) {
        let state = self.entry(section);
        state.current_value = Some(current.unwrap_or_else(|| initial.clone()));
        state.initial_value = Some(initial);
        state.validation_errors.clear();
        state.initialized = true;
        state.is_dirty = false;
    }

    /// Replace the locally edited value
    ///
    /// Before the first baseline load the value is stored but dirtiness is
    /// not evaluated.
    pub fn set_current(&mut self, section: SectionKey, value: Value) {
        let state = self.entry(section);
        state.current_value = Some(value);
        state.validation_errors.clear();
        if state.initialized {
            state.is_dirty = change_tracker::is_dirty(
                state.initial_value.as_ref(),
                state.current_value.as_ref(),
            );
        }
    }

    /// Force a section to count as changed without touching its values
    pub fn mark_dirty(&mut self, section: SectionKey) {
        let state = self.entry(section);
        state.is_dirty = true;
        state.initialized = true;
    }

    /// Revert the current value to the baseline
    pub fn reset(&mut self, section: SectionKey) {
        let state = self.entry(section);
        state.current_value = state.initial_value.clone();
        state.is_dirty = false;
        state.validation_errors.clear();
    }

    /// Record the errors of a failed save attempt
    pub(crate) fn set_errors(&mut self, section: SectionKey, errors: Vec<String>) {
        self.entry(section).validation_errors = errors;
    }
}

impl Default for ValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: SectionKey = SectionKey::PreviewStrategy;

    #[test]
    fn new_store_is_empty() {
        let store = ValueStore::new();
        for key in SAVE_ORDER {
            assert!(!store.is_initialized(key));
            assert!(!store.is_dirty(key));
            assert!(store.current(key).is_none());
        }
    }

    #[test]
    fn set_initial_clears_dirty_and_initializes() {
        let mut store = ValueStore::new();
        store.set_current(KEY, json!("serve_static_preview"));
        store.set_errors(KEY, vec!["stale".into()]);

        store.set_initial(KEY, json!("zip_only"), None);

        assert!(!store.is_dirty(KEY));
        assert!(store.is_initialized(KEY));
        assert!(store.errors(KEY).is_empty());
        assert_eq!(store.current(KEY), Some(&json!("zip_only")));
    }

    #[test]
    fn set_initial_is_idempotent() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        let once = store.section(KEY).clone();
        store.set_initial(KEY, json!("zip_only"), None);
        assert_eq!(store.section(KEY), &once);
    }

    #[test]
    fn set_initial_accepts_separate_current() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), Some(json!("serve_static_preview")));
        assert_eq!(store.current(KEY), Some(&json!("serve_static_preview")));
        assert!(!store.is_dirty(KEY));
    }

    #[test]
    fn edit_after_load_is_dirty() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        store.set_current(KEY, json!("zip_only"));
        assert!(!store.is_dirty(KEY));
        store.set_current(KEY, json!("serve_static_preview"));
        assert!(store.is_dirty(KEY));
    }

    #[test]
    fn editing_back_to_baseline_clears_dirty() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        store.set_current(KEY, json!("serve_static_preview"));
        store.set_current(KEY, json!("zip_only"));
        assert!(!store.is_dirty(KEY));
    }

    #[test]
    fn repeated_edit_is_idempotent() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        store.set_current(KEY, json!("serve_static_preview"));
        let once = store.section(KEY).clone();
        store.set_current(KEY, json!("serve_static_preview"));
        assert_eq!(store.section(KEY), &once);
    }

    #[test]
    fn edit_before_load_does_not_flag_dirty() {
        let mut store = ValueStore::new();
        store.set_current(KEY, json!("serve_static_preview"));
        assert!(!store.is_dirty(KEY));
        assert_eq!(store.current(KEY), Some(&json!("serve_static_preview")));
        assert!(store.eligible_sections().is_empty());
    }

    #[test]
    fn edit_clears_errors() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        store.set_errors(KEY, vec!["bad".into()]);
        store.set_current(KEY, json!("other"));
        assert!(store.errors(KEY).is_empty());
    }

    #[test]
    fn mark_dirty_forces_eligibility() {
        let mut store = ValueStore::new();
        store.mark_dirty(SectionKey::HitlGates);
        assert!(store.is_dirty(SectionKey::HitlGates));
        assert!(store.is_initialized(SectionKey::HitlGates));
        assert_eq!(store.eligible_sections(), vec![SectionKey::HitlGates]);
    }

    #[test]
    fn reset_restores_baseline() {
        let mut store = ValueStore::new();
        store.set_initial(KEY, json!("zip_only"), None);
        store.set_current(KEY, json!("a"));
        store.set_current(KEY, json!("b"));
        store.set_errors(KEY, vec!["bad".into()]);

        store.reset(KEY);

        assert_eq!(store.current(KEY), store.initial(KEY));
        assert!(!store.is_dirty(KEY));
        assert!(store.errors(KEY).is_empty());
    }

    #[test]
    fn dirty_sections_follow_save_order() {
        let mut store = ValueStore::new();
        for key in SAVE_ORDER {
            store.set_initial(key, json!(1), None);
        }
        store.set_current(SectionKey::HitlGates, json!(2));
        store.set_current(SectionKey::PreviewStrategy, json!(2));
        store.set_current(SectionKey::SlaConfig, json!(2));

        assert_eq!(
            store.dirty_sections(),
            vec![
                SectionKey::PreviewStrategy,
                SectionKey::SlaConfig,
                SectionKey::HitlGates
            ]
        );
        assert!(store.has_unsaved_changes());
    }
}
