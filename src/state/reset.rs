//! ResetController - Discard Local Edits

use super::value_store::ValueStore;
use crate::domain::SectionKey;

/// Reverts sections to their last-known server values. Never touches the
/// network.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResetController;

impl ResetController {
    /// Revert one section, returning whether it had unsaved edits
    pub fn reset_section(&self, store: &mut ValueStore, section: SectionKey) -> bool {
        let was_dirty = store.is_dirty(section);
        store.reset(section);
        if was_dirty {
            tracing::debug!("Discarded edits on {}", section);
        }
        was_dirty
    }

    /// Revert every dirty section, returning the sections reset
    pub fn reset_all(&self, store: &mut ValueStore) -> Vec<SectionKey> {
        let dirty = store.dirty_sections();
        for section in &dirty {
            store.reset(*section);
        }
        if !dirty.is_empty() {
            tracing::info!("Discarded edits on {} section(s)", dirty.len());
        }
        dirty
    }
}
