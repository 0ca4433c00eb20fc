//! In-Memory Configuration API
//!
//! Implements the same contract as the REST backend, including version
//! checks, for offline runs and tests. Failures can be injected per config
//! key or per SLA stage, and every write is recorded in a call log.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::api::{ConfigApi, ConfigVersion, JobStatusSource, VersionedValue};
use crate::domain::{JobSnapshot, TemplateSummary};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Backend {
    configs: HashMap<String, VersionedValue>,
    sla_rows: Vec<Value>,
    templates: Vec<TemplateSummary>,
    failures: HashMap<String, String>,
    jobs: HashMap<String, VecDeque<JobSnapshot>>,
    calls: Vec<String>,
}

/// Thread-safe in-memory backend
#[derive(Debug, Default)]
pub struct InMemoryConfigApi {
    inner: Mutex<Backend>,
}

impl InMemoryConfigApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Seeding ====================

    /// Store a config value as if another client had saved it
    pub fn seed_config(&self, key: &str, value: Value, version: ConfigVersion) {
        self.backend()
            .configs
            .insert(key.to_string(), VersionedValue::new(value, version));
    }

    pub fn seed_sla_rows(&self, rows: Vec<Value>) {
        self.backend().sla_rows = rows;
    }

    pub fn seed_templates(&self, templates: Vec<TemplateSummary>) {
        self.backend().templates = templates;
    }

    /// Queue status snapshots returned by successive `job_status` calls; the
    /// last one repeats
    pub fn seed_job(&self, job_id: &str, snapshots: Vec<JobSnapshot>) {
        self.backend()
            .jobs
            .insert(job_id.to_string(), snapshots.into());
    }

    /// Make writes to a config key (or `sla:{stage}`) fail with `message`
    pub fn fail_writes(&self, target: &str, message: &str) {
        self.backend()
            .failures
            .insert(target.to_string(), message.to_string());
    }

    /// Advance a key's version without changing its value, simulating a
    /// concurrent save by someone else
    pub fn bump_version(&self, key: &str) {
        let mut backend = self.backend();
        let entry = backend
            .configs
            .entry(key.to_string())
            .or_insert_with(|| VersionedValue::new(Value::Null, None));
        entry.version = Some(entry.version.unwrap_or(0) + 1);
    }

    // ==================== Inspection ====================

    pub fn stored(&self, key: &str) -> Option<VersionedValue> {
        self.backend().configs.get(key).cloned()
    }

    pub fn sla_rows(&self) -> Vec<Value> {
        self.backend().sla_rows.clone()
    }

    /// Write calls received so far (`put_config {key}` / `put_sla_row {stage}`)
    pub fn calls(&self) -> Vec<String> {
        self.backend().calls.clone()
    }
}

#[async_trait]
impl ConfigApi for InMemoryConfigApi {
    async fn get_config(&self, key: &str) -> Result<Option<VersionedValue>> {
        Ok(self.backend().configs.get(key).cloned())
    }

    async fn put_config(
        &self,
        key: &str,
        value: &Value,
        expected_version: ConfigVersion,
        _request_id: &str,
    ) -> Result<ConfigVersion> {
        let mut backend = self.backend();
        backend.calls.push(format!("put_config {key}"));

        if let Some(message) = backend.failures.get(key) {
            return Err(Error::Transport {
                message: message.clone(),
            });
        }

        let stored_version = backend.configs.get(key).and_then(|v| v.version);
        if stored_version != expected_version {
            return Err(Error::Conflict {
                key: key.to_string(),
            });
        }

        let version = Some(stored_version.unwrap_or(0) + 1);
        backend
            .configs
            .insert(key.to_string(), VersionedValue::new(value.clone(), version));
        Ok(version)
    }

    async fn list_sla_rows(&self) -> Result<Vec<Value>> {
        Ok(self.backend().sla_rows.clone())
    }

    async fn put_sla_row(&self, row: &Value, _request_id: &str) -> Result<()> {
        let Some(stage) = row.get("stage").and_then(Value::as_str) else {
            return Err(Error::Invalid {
                message: "SLA row has no stage".to_string(),
            });
        };

        let mut backend = self.backend();
        backend.calls.push(format!("put_sla_row {stage}"));

        if let Some(message) = backend.failures.get(&format!("sla:{stage}")) {
            return Err(Error::Transport {
                message: message.clone(),
            });
        }

        let existing = backend
            .sla_rows
            .iter_mut()
            .find(|r| r.get("stage").and_then(Value::as_str) == Some(stage));
        match existing {
            Some(slot) => *slot = row.clone(),
            None => backend.sla_rows.push(row.clone()),
        }
        Ok(())
    }

    async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
        Ok(self.backend().templates.clone())
    }
}

#[async_trait]
impl JobStatusSource for InMemoryConfigApi {
    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot> {
        let mut backend = self.backend();
        let Some(queue) = backend.jobs.get_mut(job_id) else {
            return Err(Error::Transport {
                message: format!("Job not found: {job_id}"),
            });
        };

        let snapshot = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        snapshot.ok_or_else(|| Error::Transport {
            message: format!("No status for job {job_id}"),
        })
    }
}
