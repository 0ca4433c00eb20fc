//! Configuration Editor
//!
//! The object a settings page binds to: loads every section from the config
//! API, funnels edits into the [`ValueStore`], and exposes per-section save,
//! save-all and discard operations with one global error banner.

use crossbeam_channel::Sender;
use serde_json::Value;
use std::sync::Arc;

use super::api::{ConfigApi, ConfigVersion};
use super::events::EditorEvent;
use super::orchestrator::{
    SaveFailure, SaveOrchestrator, SaveReport, SaveStatusHandle, VersionTable,
};
use super::persister::Persister;
use crate::domain::settings::default_value;
use crate::domain::{AccessPolicy, DefaultAccessPolicy, Role, SAVE_ORDER, SectionKey, TemplateSummary};
use crate::error::Result;
use crate::state::{ResetController, ValidationContext, ValueStore};

/// Status badge shown next to each section
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionStatus {
    Saved,
    Dirty,
    Saving,
    Error,
}

/// Badge for `section` given the store and the live save state
pub fn section_status(
    store: &ValueStore,
    saving: &SaveStatusHandle,
    section: SectionKey,
) -> SectionStatus {
    if saving.in_flight() == Some(section) {
        SectionStatus::Saving
    } else if !store.errors(section).is_empty() {
        SectionStatus::Error
    } else if store.is_dirty(section) {
        SectionStatus::Dirty
    } else {
        SectionStatus::Saved
    }
}

/// Optional collaborators of the editor
pub struct EditorOptions {
    /// Per-section permission predicate
    pub policy: Arc<dyn AccessPolicy>,
    /// Channel receiving [`EditorEvent`]s
    pub events: Option<Sender<EditorEvent>>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            policy: Arc::new(DefaultAccessPolicy),
            events: None,
        }
    }
}

/// Section-scoped configuration editor
pub struct ConfigEditor {
    api: Arc<dyn ConfigApi>,
    role: Role,
    store: ValueStore,
    versions: VersionTable,
    context: ValidationContext,
    orchestrator: SaveOrchestrator,
    reset: ResetController,
    last_failure: Option<SaveFailure>,
    events: Option<Sender<EditorEvent>>,
}

impl ConfigEditor {
    /// Editor using the default access policy and no event channel
    pub fn new(api: Arc<dyn ConfigApi>, role: Role) -> Self {
        Self::with_options(api, role, EditorOptions::default())
    }

    pub fn with_options(api: Arc<dyn ConfigApi>, role: Role, options: EditorOptions) -> Self {
        let persister = Persister::new(api.clone(), options.policy);
        Self {
            api,
            role,
            store: ValueStore::new(),
            versions: VersionTable::default(),
            context: ValidationContext::default(),
            orchestrator: SaveOrchestrator::new(persister, options.events.clone()),
            reset: ResetController,
            last_failure: None,
            events: options.events,
        }
    }

    // ==================== Loading ====================

    /// Load the template registry and every section's baseline.
    ///
    /// Sections the server has never stored, or that fail to load, start
    /// from their default value.
    pub async fn load_all(&mut self) {
        match self.api.list_templates().await {
            Ok(templates) => self.context = ValidationContext::with_templates(templates),
            Err(err) => tracing::warn!("Failed to load template registry: {}", err),
        }

        for section in SAVE_ORDER {
            self.reload_section(section).await;
        }
        tracing::info!(
            "Loaded {} config section(s), {} template(s)",
            SAVE_ORDER.len(),
            self.context.templates.len()
        );
    }

    /// Re-fetch one section from the server, replacing its baseline and
    /// discarding local edits
    pub async fn reload_section(&mut self, section: SectionKey) {
        let (value, version) = match self.fetch(section).await {
            Ok(Some(loaded)) => loaded,
            Ok(None) => {
                tracing::debug!("{} not set on server, using default", section);
                (default_value(section), None)
            }
            Err(err) => {
                tracing::warn!("Failed to load {}, using default: {}", section, err);
                (default_value(section), None)
            }
        };

        self.versions.set(section, version);
        self.store.set_initial(section, value, None);
        if self
            .last_failure
            .as_ref()
            .is_some_and(|failure| failure.section == section)
        {
            self.last_failure = None;
        }
    }

    async fn fetch(&self, section: SectionKey) -> Result<Option<(Value, ConfigVersion)>> {
        if section.is_row_backed() {
            let rows = self.api.list_sla_rows().await?;
            return Ok(Some((Value::Array(rows), None)));
        }
        let loaded = self.api.get_config(section.as_str()).await?;
        Ok(loaded.map(|v| (v.value, v.version)))
    }

    // ==================== Editing ====================

    /// Replace a section's edited value
    pub fn set_current(&mut self, section: SectionKey, value: Value) {
        self.store.set_current(section, value);
    }

    /// Treat a section as changed regardless of its value
    pub fn mark_dirty(&mut self, section: SectionKey) {
        self.store.mark_dirty(section);
    }

    /// Replace the template registry used by the default-template validator
    pub fn set_templates(&mut self, templates: Vec<TemplateSummary>) {
        self.context = ValidationContext::with_templates(templates);
    }

    // ==================== Saving ====================

    /// Save every dirty section in save order, halting at the first failure
    pub async fn save_all(&mut self) -> Result<SaveReport> {
        let report = self
            .orchestrator
            .save_all(&mut self.store, &mut self.versions, &self.context, self.role)
            .await?;
        self.record(&report);
        Ok(report)
    }

    /// Save a single section
    pub async fn save_section(&mut self, section: SectionKey) -> Result<SaveReport> {
        let report = self
            .orchestrator
            .save_section(section, &mut self.store, &mut self.versions, &self.context, self.role)
            .await?;
        self.record(&report);
        Ok(report)
    }

    fn record(&mut self, report: &SaveReport) {
        match &report.failure {
            Some(failure) => self.last_failure = Some(failure.clone()),
            None if !report.saved.is_empty() => self.last_failure = None,
            None => {}
        }
    }

    // ==================== Discarding ====================

    /// Discard edits on one section
    pub fn reset_section(&mut self, section: SectionKey) -> bool {
        let was_dirty = self.reset.reset_section(&mut self.store, section);
        if self
            .last_failure
            .as_ref()
            .is_some_and(|failure| failure.section == section)
        {
            self.last_failure = None;
        }
        if was_dirty {
            self.emit(EditorEvent::SectionsReset {
                sections: vec![section],
            });
        }
        was_dirty
    }

    /// Discard edits on every dirty section
    pub fn reset_all(&mut self) -> Vec<SectionKey> {
        let sections = self.reset.reset_all(&mut self.store);
        self.last_failure = None;
        if !sections.is_empty() {
            self.emit(EditorEvent::SectionsReset {
                sections: sections.clone(),
            });
        }
        sections
    }

    fn emit(&self, event: EditorEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    // ==================== Getters ====================

    pub fn status(&self, section: SectionKey) -> SectionStatus {
        section_status(&self.store, &self.save_status(), section)
    }

    /// Global banner naming the section that stopped the last save
    pub fn banner(&self) -> Option<String> {
        self.last_failure.as_ref().map(SaveFailure::banner)
    }

    pub fn value(&self, section: SectionKey) -> Option<&Value> {
        self.store.current(section)
    }

    pub fn errors(&self, section: SectionKey) -> &[String] {
        self.store.errors(section)
    }

    pub fn version(&self, section: SectionKey) -> ConfigVersion {
        self.versions.get(section)
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn templates(&self) -> &[TemplateSummary] {
        &self.context.templates
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Whether save controls should be disabled
    pub fn is_saving(&self) -> bool {
        self.orchestrator.status_handle().is_saving()
    }

    /// Handle for reading the save state while `save_all` or
    /// `save_section` holds the editor
    pub fn save_status(&self) -> SaveStatusHandle {
        self.orchestrator.status_handle()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.has_unsaved_changes()
    }
}

impl std::fmt::Debug for ConfigEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEditor")
            .field("role", &self.role)
            .field("dirty", &self.store.dirty_sections())
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}
