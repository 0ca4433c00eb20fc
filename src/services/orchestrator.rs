//! Save Orchestrator
//!
//! Commits dirty sections one at a time in [`SAVE_ORDER`](crate::domain::SAVE_ORDER),
//! stopping at the first section that fails validation, authorization or
//! persistence.
//!
//! ```text
//!   Idle ──save_all──▶ Saving ──all stored──▶ Idle (success)
//!                        │
//!                        └──first failure──▶ Idle (halted, banner set)
//! ```

use crossbeam_channel::Sender;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::api::ConfigVersion;
use super::events::EditorEvent;
use super::persister::Persister;
use crate::constants::CONFLICT_MESSAGE;
use crate::domain::{Role, SectionKey};
use crate::error::{Error, FailureKind, Result};
use crate::state::{ValidationContext, ValueStore, validate};

/// Orchestrator state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
}

/// Why a save run stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveFailure {
    pub section: SectionKey,
    pub kind: FailureKind,
    pub message: String,
}

impl SaveFailure {
    /// Classify `err` and pick the message recorded on the section
    pub fn from_error(section: SectionKey, err: &Error) -> Self {
        let message = match err {
            Error::Conflict { .. } => CONFLICT_MESSAGE.to_string(),
            Error::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            section,
            kind: err.failure_kind(),
            message,
        }
    }

    /// Global banner text naming the failed section
    pub fn banner(&self) -> String {
        format!("{} was not saved: {}", self.section.label(), self.message)
    }
}

/// Outcome of a save run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Sections stored during this run, in order
    pub saved: Vec<SectionKey>,
    /// Set when the run halted
    pub failure: Option<SaveFailure>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Last known version token per section
#[derive(Clone, Debug, Default)]
pub struct VersionTable {
    versions: HashMap<SectionKey, ConfigVersion>,
}

impl VersionTable {
    pub fn get(&self, section: SectionKey) -> ConfigVersion {
        self.versions.get(&section).copied().flatten()
    }

    pub fn set(&mut self, section: SectionKey, version: ConfigVersion) {
        self.versions.insert(section, version);
    }
}

#[derive(Debug, Default)]
struct SaveFlags {
    saving: AtomicBool,
    in_flight: Mutex<Option<SectionKey>>,
}

impl SaveFlags {
    fn set_in_flight(&self, section: Option<SectionKey>) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = section;
    }

    fn in_flight(&self) -> Option<SectionKey> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SaveState {
        if self.saving.load(Ordering::SeqCst) {
            SaveState::Saving
        } else {
            SaveState::Idle
        }
    }
}

/// Read-only view of the orchestrator's run state.
///
/// Cloned out before a save starts so a UI can render the "saving" badge
/// while the run holds the store mutably.
#[derive(Clone, Debug)]
pub struct SaveStatusHandle {
    flags: Arc<SaveFlags>,
}

impl SaveStatusHandle {
    pub fn state(&self) -> SaveState {
        self.flags.state()
    }

    pub fn is_saving(&self) -> bool {
        self.flags.state() == SaveState::Saving
    }

    /// Section currently being persisted
    pub fn in_flight(&self) -> Option<SectionKey> {
        self.flags.in_flight()
    }
}

/// Releases the saving flag when a run ends or its future is dropped
struct SavingGuard {
    flags: Arc<SaveFlags>,
}

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.flags.set_in_flight(None);
        self.flags.saving.store(false, Ordering::SeqCst);
    }
}

/// Drives sequential section saves
pub struct SaveOrchestrator {
    persister: Persister,
    flags: Arc<SaveFlags>,
    events: Option<Sender<EditorEvent>>,
}

impl SaveOrchestrator {
    pub fn new(persister: Persister, events: Option<Sender<EditorEvent>>) -> Self {
        Self {
            persister,
            flags: Arc::new(SaveFlags::default()),
            events,
        }
    }

    pub fn state(&self) -> SaveState {
        self.flags.state()
    }

    /// Section currently being persisted
    pub fn in_flight(&self) -> Option<SectionKey> {
        self.flags.in_flight()
    }

    /// Handle that observes this orchestrator's runs
    pub fn status_handle(&self) -> SaveStatusHandle {
        SaveStatusHandle {
            flags: self.flags.clone(),
        }
    }

    fn begin(&self) -> Result<SavingGuard> {
        if self.flags.saving.swap(true, Ordering::SeqCst) {
            return Err(Error::SaveInProgress);
        }
        Ok(SavingGuard {
            flags: self.flags.clone(),
        })
    }

    fn emit(&self, event: EditorEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Save every dirty, initialized section in save order.
    ///
    /// Section failures are reported in the returned [`SaveReport`]; the only
    /// error is [`Error::SaveInProgress`] when a run is already active.
    pub async fn save_all(
        &self,
        store: &mut ValueStore,
        versions: &mut VersionTable,
        context: &ValidationContext,
        role: Role,
    ) -> Result<SaveReport> {
        let sections = store.eligible_sections();
        self.run(sections, store, versions, context, role).await
    }

    /// Save one section if it has unsaved edits
    pub async fn save_section(
        &self,
        section: SectionKey,
        store: &mut ValueStore,
        versions: &mut VersionTable,
        context: &ValidationContext,
        role: Role,
    ) -> Result<SaveReport> {
        let sections = if store.section(section).is_eligible_for_save() {
            vec![section]
        } else {
            Vec::new()
        };
        self.run(sections, store, versions, context, role).await
    }

    async fn run(
        &self,
        sections: Vec<SectionKey>,
        store: &mut ValueStore,
        versions: &mut VersionTable,
        context: &ValidationContext,
        role: Role,
    ) -> Result<SaveReport> {
        let _guard = self.begin()?;
        let mut report = SaveReport::default();

        if sections.is_empty() {
            tracing::debug!("Nothing to save");
            return Ok(report);
        }

        tracing::info!("Saving {} section(s)", sections.len());
        self.emit(EditorEvent::SaveStarted {
            sections: sections.clone(),
        });

        for section in sections {
            match self.save_one(section, store, versions, context, role).await {
                Ok(version) => {
                    self.emit(EditorEvent::SectionSaved { section, version });
                    report.saved.push(section);
                }
                Err(failure) => {
                    tracing::warn!("Save halted at {}: {}", section, failure.message);
                    store.set_errors(section, vec![failure.message.clone()]);
                    self.emit(EditorEvent::SaveHalted {
                        section,
                        kind: failure.kind,
                        message: failure.message.as_str().into(),
                    });
                    report.failure = Some(failure);
                    return Ok(report);
                }
            }
        }

        tracing::info!("Saved {} section(s)", report.saved.len());
        self.emit(EditorEvent::SaveCompleted {
            saved: report.saved.clone(),
            finished_at: chrono::Utc::now(),
        });
        Ok(report)
    }

    async fn save_one(
        &self,
        section: SectionKey,
        store: &mut ValueStore,
        versions: &mut VersionTable,
        context: &ValidationContext,
        role: Role,
    ) -> Result<ConfigVersion, SaveFailure> {
        self.persist_one(section, store, versions, context, role)
            .await
            .map_err(|err| SaveFailure::from_error(section, &err))
    }

    async fn persist_one(
        &self,
        section: SectionKey,
        store: &mut ValueStore,
        versions: &mut VersionTable,
        context: &ValidationContext,
        role: Role,
    ) -> Result<ConfigVersion> {
        let value = store.current(section).cloned().unwrap_or(Value::Null);

        if let Some(message) = validate(section, &value, context) {
            return Err(Error::Validation { section, message });
        }

        self.flags.set_in_flight(Some(section));
        self.emit(EditorEvent::SectionSaving { section });
        let result = self
            .persister
            .save(section, &value, versions.get(section), role)
            .await;
        self.flags.set_in_flight(None);

        let version = result?;
        versions.set(section, version);
        store.set_initial(section, value, None);
        Ok(version)
    }
}

impl std::fmt::Debug for SaveOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveOrchestrator")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DefaultAccessPolicy, SAVE_ORDER, TemplateSummary};
    use crate::services::{ConfigApi, InMemoryConfigApi, VersionedValue};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        api: Arc<InMemoryConfigApi>,
        orchestrator: SaveOrchestrator,
        store: ValueStore,
        versions: VersionTable,
        context: ValidationContext,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(InMemoryConfigApi::new());
        let persister = Persister::new(api.clone(), Arc::new(DefaultAccessPolicy));
        let mut store = ValueStore::new();
        store.set_initial(SectionKey::PreviewStrategy, json!("zip_only"), None);
        store.set_initial(SectionKey::TemplatesDefault, json!(""), None);
        store.set_initial(SectionKey::SlaConfig, json!([]), None);
        store.set_initial(
            SectionKey::Thresholds,
            json!({
                "build_pass_score": 80, "qa_pass_score": 80, "axe_max_critical": 0,
                "lighthouse_min_performance": 90, "lighthouse_min_accessibility": 90,
                "lighthouse_min_best_practices": 90, "lighthouse_min_seo": 90
            }),
            None,
        );
        store.set_initial(SectionKey::HitlGates, json!({"build_review": false}), None);

        Fixture {
            api,
            orchestrator: SaveOrchestrator::new(persister, None),
            store,
            versions: VersionTable::default(),
            context: ValidationContext::with_templates(vec![TemplateSummary::new("t1", "Landing")]),
        }
    }

    impl Fixture {
        async fn save_all(&mut self) -> SaveReport {
            self.orchestrator
                .save_all(&mut self.store, &mut self.versions, &self.context, Role::Admin)
                .await
                .expect("not already saving")
        }
    }

    fn break_thresholds(store: &mut ValueStore) {
        let mut value = store.current(SectionKey::Thresholds).cloned().expect("loaded");
        value["qa_pass_score"] = json!(-5);
        store.set_current(SectionKey::Thresholds, value);
    }

    #[tokio::test]
    async fn saves_valid_section_then_halts_on_invalid_one() {
        let mut f = fixture();
        f.store
            .set_current(SectionKey::PreviewStrategy, json!("serve_static_preview"));
        break_thresholds(&mut f.store);

        let report = f.save_all().await;

        assert_eq!(report.saved, vec![SectionKey::PreviewStrategy]);
        let failure = report.failure.expect("thresholds halt");
        assert_eq!(failure.section, SectionKey::Thresholds);
        assert_eq!(failure.kind, FailureKind::Validation);
        assert!(failure.banner().contains("Quality thresholds"));

        assert!(!f.store.is_dirty(SectionKey::PreviewStrategy));
        assert_eq!(
            f.store.initial(SectionKey::PreviewStrategy),
            Some(&json!("serve_static_preview"))
        );
        assert!(f.store.is_dirty(SectionKey::Thresholds));
        assert_eq!(f.store.errors(SectionKey::Thresholds).len(), 1);
        assert_eq!(f.api.calls(), vec!["put_config preview_strategy"]);
        assert_eq!(f.orchestrator.state(), SaveState::Idle);
    }

    #[tokio::test]
    async fn earlier_validation_failure_blocks_later_sections() {
        let mut f = fixture();
        f.store.set_current(SectionKey::PreviewStrategy, json!("other"));
        f.store
            .set_current(SectionKey::HitlGates, json!({"build_review": true}));

        let report = f.save_all().await;

        assert!(report.saved.is_empty());
        assert_eq!(
            report.failure.map(|fail| fail.section),
            Some(SectionKey::PreviewStrategy)
        );
        assert!(f.api.calls().is_empty());
        assert!(f.store.is_dirty(SectionKey::HitlGates));
    }

    #[tokio::test]
    async fn conflict_keeps_local_value_and_dirty_flag() {
        let mut f = fixture();
        f.api.bump_version("hitl_gates");
        f.store
            .set_current(SectionKey::HitlGates, json!({"build_review": true}));

        let report = f.save_all().await;

        let failure = report.failure.expect("conflict");
        assert_eq!(failure.kind, FailureKind::Conflict);
        assert_eq!(failure.message, CONFLICT_MESSAGE);
        assert!(f.store.is_dirty(SectionKey::HitlGates));
        assert_eq!(f.store.errors(SectionKey::HitlGates), [CONFLICT_MESSAGE.to_string()]);
        assert_eq!(
            f.store.current(SectionKey::HitlGates),
            Some(&json!({"build_review": true}))
        );
    }

    #[tokio::test]
    async fn success_stores_versions_and_clears_dirty() {
        let mut f = fixture();
        f.api.seed_config("templates_default", json!(""), Some(3));
        f.versions.set(SectionKey::TemplatesDefault, Some(3));
        f.store.set_current(SectionKey::TemplatesDefault, json!("t1"));
        f.store.set_current(
            SectionKey::SlaConfig,
            json!([{"stage": "BUILD", "default_days": 2, "warning_threshold_days": 3, "critical_threshold_days": 5}]),
        );

        let report = f.save_all().await;

        assert!(report.is_success());
        assert_eq!(
            report.saved,
            vec![SectionKey::TemplatesDefault, SectionKey::SlaConfig]
        );
        assert_eq!(f.versions.get(SectionKey::TemplatesDefault), Some(4));
        assert!(f.store.dirty_sections().is_empty());
        assert_eq!(
            f.api.calls(),
            vec!["put_config templates_default", "put_sla_row BUILD"]
        );
    }

    #[tokio::test]
    async fn transport_failure_surfaces_server_message() {
        let mut f = fixture();
        f.api.fail_writes("preview_strategy", "backend unavailable");
        f.store
            .set_current(SectionKey::PreviewStrategy, json!("serve_static_preview"));

        let report = f.save_all().await;
        let failure = report.failure.expect("transport failure");
        assert_eq!(failure.kind, FailureKind::Transport);
        assert_eq!(failure.message, "backend unavailable");
    }

    #[tokio::test]
    async fn role_violation_is_reported_as_authorization() {
        let mut f = fixture();
        let mut value = f.store.current(SectionKey::Thresholds).cloned().expect("loaded");
        value["qa_pass_score"] = json!(70);
        f.store.set_current(SectionKey::Thresholds, value);

        let report = f
            .orchestrator
            .save_all(&mut f.store, &mut f.versions, &f.context, Role::DeliveryLead)
            .await
            .expect("run");

        assert_eq!(
            report.failure.map(|fail| fail.kind),
            Some(FailureKind::Authorization)
        );
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn save_section_ignores_clean_sections() {
        let mut f = fixture();
        let report = f
            .orchestrator
            .save_section(
                SectionKey::HitlGates,
                &mut f.store,
                &mut f.versions,
                &f.context,
                Role::Admin,
            )
            .await
            .expect("run");
        assert_eq!(report, SaveReport::default());
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn reentrant_trigger_is_rejected() {
        let mut f = fixture();
        let _guard = f.orchestrator.begin().expect("first run");

        let result = f
            .orchestrator
            .save_all(&mut f.store, &mut f.versions, &f.context, Role::Admin)
            .await;
        assert!(matches!(result, Err(Error::SaveInProgress)));
    }

    #[tokio::test]
    async fn emits_events_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let api = Arc::new(InMemoryConfigApi::new());
        let orchestrator = SaveOrchestrator::new(
            Persister::new(api, Arc::new(DefaultAccessPolicy)),
            Some(tx),
        );
        let mut store = ValueStore::new();
        store.set_initial(SectionKey::PreviewStrategy, json!("zip_only"), None);
        store.set_current(SectionKey::PreviewStrategy, json!("serve_static_preview"));

        orchestrator
            .save_all(
                &mut store,
                &mut VersionTable::default(),
                &ValidationContext::default(),
                Role::Admin,
            )
            .await
            .expect("run");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], EditorEvent::SaveStarted { .. }));
        assert!(matches!(
            events[1],
            EditorEvent::SectionSaving {
                section: SectionKey::PreviewStrategy
            }
        ));
        assert!(matches!(
            events[2],
            EditorEvent::SectionSaved {
                section: SectionKey::PreviewStrategy,
                version: Some(1)
            }
        ));
        assert!(matches!(events[3], EditorEvent::SaveCompleted { .. }));
    }

    struct StalledApi;

    #[async_trait]
    impl ConfigApi for StalledApi {
        async fn get_config(&self, _key: &str) -> Result<Option<VersionedValue>> {
            Ok(None)
        }

        async fn put_config(
            &self,
            _key: &str,
            _value: &Value,
            _expected_version: ConfigVersion,
            _request_id: &str,
        ) -> Result<ConfigVersion> {
            futures::future::pending().await
        }

        async fn list_sla_rows(&self) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn put_sla_row(&self, _row: &Value, _request_id: &str) -> Result<()> {
            Ok(())
        }

        async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn sla_row_without_stage_fails_before_any_write() {
        let mut f = fixture();
        f.store.set_current(
            SectionKey::SlaConfig,
            json!([
                {"stage": "BUILD", "default_days": 1, "warning_threshold_days": 2, "critical_threshold_days": 3},
                {"default_days": 1, "warning_threshold_days": 2, "critical_threshold_days": 3}
            ]),
        );

        let report = f.save_all().await;

        let failure = report.failure.expect("halted");
        assert_eq!(failure.section, SectionKey::SlaConfig);
        assert_eq!(failure.kind, FailureKind::Validation);
        assert_eq!(failure.message, "SLA row #2 must name its stage");
        assert!(f.api.calls().is_empty());
        assert!(f.api.sla_rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn status_handle_sees_the_section_in_flight() {
        let orchestrator = SaveOrchestrator::new(
            Persister::new(Arc::new(StalledApi), Arc::new(DefaultAccessPolicy)),
            None,
        );
        let handle = orchestrator.status_handle();
        let mut store = ValueStore::new();
        store.set_initial(SectionKey::PreviewStrategy, json!("zip_only"), None);
        store.set_current(SectionKey::PreviewStrategy, json!("serve_static_preview"));
        let mut versions = VersionTable::default();
        let context = ValidationContext::default();

        let save = orchestrator.save_all(&mut store, &mut versions, &context, Role::Admin);
        tokio::pin!(save);
        let pending = tokio::time::timeout(Duration::from_secs(1), &mut save).await;

        assert!(pending.is_err());
        assert!(handle.is_saving());
        assert_eq!(handle.in_flight(), Some(SectionKey::PreviewStrategy));
    }

    #[test]
    fn failure_messages_by_error_kind() {
        let validation = SaveFailure::from_error(
            SectionKey::PreviewStrategy,
            &Error::Validation {
                section: SectionKey::PreviewStrategy,
                message: "Preview strategy must be one of: zip_only".into(),
            },
        );
        assert_eq!(validation.kind, FailureKind::Validation);
        assert_eq!(validation.message, "Preview strategy must be one of: zip_only");

        let conflict = SaveFailure::from_error(
            SectionKey::Thresholds,
            &Error::Conflict {
                key: "thresholds".into(),
            },
        );
        assert_eq!(conflict.kind, FailureKind::Conflict);
        assert_eq!(conflict.message, CONFLICT_MESSAGE);

        let transport = SaveFailure::from_error(
            SectionKey::Thresholds,
            &Error::Transport {
                message: "bad gateway (HTTP 502)".into(),
            },
        );
        assert_eq!(transport.kind, FailureKind::Transport);
        assert_eq!(transport.message, "bad gateway (HTTP 502)");
    }

    #[tokio::test]
    async fn abandoned_save_releases_the_flag() {
        let orchestrator = SaveOrchestrator::new(
            Persister::new(Arc::new(StalledApi), Arc::new(DefaultAccessPolicy)),
            None,
        );
        let mut store = ValueStore::new();
        for key in SAVE_ORDER {
            store.set_initial(key, json!(null), None);
        }
        store.set_current(SectionKey::HitlGates, json!({"build_review": true}));
        let mut versions = VersionTable::default();
        let context = ValidationContext::default();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            orchestrator.save_all(&mut store, &mut versions, &context, Role::Admin),
        )
        .await;

        assert!(abandoned.is_err());
        assert_eq!(orchestrator.state(), SaveState::Idle);
        assert_eq!(orchestrator.in_flight(), None);
        assert!(store.is_dirty(SectionKey::HitlGates));
    }
}
