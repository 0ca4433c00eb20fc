//! Persister - Section Saves Against the Config API
//!
//! One save attempt per section. Scalar sections are a single versioned
//! write; the SLA section fans out into one write per stage row, issued
//! concurrently, and fails as a whole if any row fails. Rows that were
//! already stored are not rolled back.

use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use super::api::{ConfigApi, ConfigVersion};
use crate::domain::{AccessPolicy, Role, SectionKey};
use crate::error::{Error, Result};

/// Saves sections after checking the session role
#[derive(Clone)]
pub struct Persister {
    api: Arc<dyn ConfigApi>,
    policy: Arc<dyn AccessPolicy>,
}

impl Persister {
    pub fn new(api: Arc<dyn ConfigApi>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { api, policy }
    }

    /// Persist `value` for `section`, returning the version to remember.
    ///
    /// Role violations fail before any request is made.
    pub async fn save(
        &self,
        section: SectionKey,
        value: &Value,
        known_version: ConfigVersion,
        role: Role,
    ) -> Result<ConfigVersion> {
        if !self.policy.can_save(role, section) {
            tracing::warn!("{} may not save {}", role, section);
            return Err(Error::Unauthorized { section, role });
        }

        let request_id = uuid::Uuid::now_v7().to_string();
        tracing::info!(
            "Saving {} (version {:?}, request {})",
            section,
            known_version,
            request_id
        );

        if section.is_row_backed() {
            self.save_rows(section, value, &request_id).await?;
            return Ok(known_version);
        }

        self.api
            .put_config(section.as_str(), value, known_version, &request_id)
            .await
    }

    async fn save_rows(&self, section: SectionKey, value: &Value, request_id: &str) -> Result<()> {
        let Some(rows) = value.as_array() else {
            return Err(Error::Invalid {
                message: format!("{section} must be a list of rows"),
            });
        };

        let results = join_all(rows.iter().map(|row| self.api.put_sla_row(row, request_id))).await;
        let total = results.len();
        let mut failures = results.into_iter().filter_map(Result::err).collect::<Vec<_>>();

        if failures.is_empty() {
            tracing::debug!("Stored {} {} row(s)", total, section);
            return Ok(());
        }

        tracing::warn!(
            "{} of {} {} row(s) failed; stored rows are kept",
            failures.len(),
            total,
            section
        );
        Err(failures.remove(0))
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister").finish_non_exhaustive()
    }
}
