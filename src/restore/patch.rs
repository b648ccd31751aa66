//! Reverse patch construction
//!
//! The value a field held right after a target entry is the `old` value of
//! the first later entry that changed that field. Later changes to the same
//! field are irrelevant once that one is found.

use crate::audit::AuditLogEntry;
use crate::models::entity::RESERVED_FIELDS;
use crate::models::Patch;

/// Patch plus how many entries contributed to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReversePatch {
    pub patch: Patch,
    pub contributing_entries: usize,
}

impl ReversePatch {
    pub fn is_empty(&self) -> bool {
        self.patch.is_empty()
    }

    /// Patched field names, sorted
    pub fn fields(&self) -> Vec<String> {
        self.patch.keys().cloned().collect()
    }
}

/// Build the patch that returns an entity to its state right after the target
///
/// `subsequent` must be ordered newest first. Each field takes the `old`
/// value of the oldest subsequent entry that changed it, which is the entry
/// nearest to the target. Store-managed fields (`id`, `version`, timestamps)
/// are never part of the patch, even if an entry recorded them.
pub fn build_reverse_patch(subsequent: &[AuditLogEntry]) -> ReversePatch {
    let mut patch = Patch::new();
    let mut contributors = vec![false; subsequent.len()];

    // Walk oldest to newest; the first change seen for a field is the nearest
    for (index, entry) in subsequent.iter().enumerate().rev() {
        for (field, change) in &entry.diff {
            if RESERVED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            if !patch.contains_key(field) {
                patch.insert(field.clone(), change.old.clone());
                contributors[index] = true;
            }
        }
    }

    ReversePatch {
        patch,
        contributing_entries: contributors.into_iter().filter(|c| *c).count(),
    }
}
