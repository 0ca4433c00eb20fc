//! Configuration API Contract
//!
//! The editor only talks to the backend through these traits. Scalar config
//! values carry an optimistic-concurrency version; SLA rows do not and are
//! last-write-wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{JobSnapshot, TemplateSummary};
use crate::error::Result;

/// Optimistic-concurrency token of a config value (`None` = never stored)
pub type ConfigVersion = Option<i64>;

/// A config value together with its version
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Value,
    #[serde(default)]
    pub version: ConfigVersion,
}

impl VersionedValue {
    pub fn new(value: Value, version: ConfigVersion) -> Self {
        Self { value, version }
    }
}

/// Backend operations used by the configuration editor
#[async_trait]
pub trait ConfigApi: Send + Sync {
    /// Fetch one config value; `Ok(None)` when it was never set
    async fn get_config(&self, key: &str) -> Result<Option<VersionedValue>>;

    /// Store a config value if the server still holds `expected_version`.
    ///
    /// Returns the new version. Fails with `Error::Conflict` on mismatch.
    async fn put_config(
        &self,
        key: &str,
        value: &Value,
        expected_version: ConfigVersion,
        request_id: &str,
    ) -> Result<ConfigVersion>;

    /// Fetch every SLA row (one per pipeline stage)
    async fn list_sla_rows(&self) -> Result<Vec<Value>>;

    /// Store one SLA row, keyed by its `stage` field
    async fn put_sla_row(&self, row: &Value, request_id: &str) -> Result<()>;

    /// Fetch the template registry
    async fn list_templates(&self) -> Result<Vec<TemplateSummary>>;
}

/// Source of delivery job status, polled while a job runs
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot>;
}
