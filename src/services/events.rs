//! Editor Events
//!
//! Notifications emitted by the service layer while saving and polling, to be
//! consumed by the UI layer (status badges, global banner, toasts).

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::{JobSnapshot, SectionKey};
use crate::error::FailureKind;

/// Events emitted by the editor services
#[derive(Clone, Debug)]
pub enum EditorEvent {
    // ==================== Saving ====================
    /// A save run started
    SaveStarted {
        /// Sections queued, in save order
        sections: Vec<SectionKey>,
    },

    /// A section passed validation and is being persisted
    SectionSaving { section: SectionKey },

    /// One section was stored and its baseline reset
    SectionSaved {
        section: SectionKey,
        /// Version returned by the server
        version: Option<i64>,
    },

    /// A save run stopped at a failing section
    SaveHalted {
        section: SectionKey,
        kind: FailureKind,
        message: Arc<str>,
    },

    /// Every queued section was stored
    SaveCompleted {
        saved: Vec<SectionKey>,
        finished_at: DateTime<Utc>,
    },

    // ==================== Editing ====================
    /// Local edits were discarded
    SectionsReset { sections: Vec<SectionKey> },

    // ==================== Jobs ====================
    /// A polled job reported a status
    JobProgress(JobSnapshot),
}
