//! Role - Session Roles and Section Permissions

use serde::{Deserialize, Serialize};
use std::fmt;

use super::section::SectionKey;

/// Role of the signed-in console user
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access
    #[default]
    Viewer,
    /// Client-facing account manager
    AccountManager,
    /// Delivery lead running the pipeline
    DeliveryLead,
    /// Console administrator
    Admin,
}

impl Role {
    /// Stable identifier used in settings files
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::AccountManager => "account_manager",
            Role::DeliveryLead => "delivery_lead",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-section permission predicate applied before any save reaches the API
pub trait AccessPolicy: Send + Sync {
    /// Whether `role` may persist `section`
    fn can_save(&self, role: Role, section: SectionKey) -> bool;
}

/// Default console policy.
///
/// Quality thresholds and approval gates decide whether work ships, so only
/// admins may change them. Delivery leads manage the rest of the pipeline
/// settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAccessPolicy;

impl AccessPolicy for DefaultAccessPolicy {
    fn can_save(&self, role: Role, section: SectionKey) -> bool {
        match section {
            SectionKey::Thresholds | SectionKey::HitlGates => role == Role::Admin,
            SectionKey::PreviewStrategy | SectionKey::TemplatesDefault | SectionKey::SlaConfig => {
                matches!(role, Role::Admin | Role::DeliveryLead)
            }
        }
    }
}
