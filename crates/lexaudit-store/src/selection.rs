//! Selection rules for the review session.
//!
//! A selection is either absent or names an update currently in the list.
//! When nothing is selected and the list is non-empty, the first update in
//! arrival order becomes the default; a selection that is still present is
//! never overridden.

use lexaudit_core::{Update, UpdateId};

/// Selection to hold after the update list changed.
///
/// Keeps `current` if it is still listed, otherwise falls back to the first
/// update. A selection that vanished (resolved here or by another reviewer)
/// is treated the same either way: cleared, then defaulted.
pub fn reconcile(updates: &[Update], current: Option<&UpdateId>) -> Option<UpdateId> {
    current
        .filter(|id| contains(updates, id))
        .cloned()
        .or_else(|| default_selection(updates))
}

/// Selection after an explicit request for `requested`.
///
/// Returns `None` when `requested` is not listed; the caller keeps its
/// current selection in that case.
pub fn explicit(updates: &[Update], requested: &UpdateId) -> Option<UpdateId> {
    contains(updates, requested).then(|| requested.clone())
}

pub fn default_selection(updates: &[Update]) -> Option<UpdateId> {
    updates.first().map(|u| u.id.clone())
}

/// Whether `selected` satisfies the selection invariant for `updates`.
pub fn is_valid(updates: &[Update], selected: Option<&UpdateId>) -> bool {
    selected.is_none_or(|id| contains(updates, id))
}

pub(crate) fn contains(updates: &[Update], id: &UpdateId) -> bool {
    updates.iter().any(|u| &u.id == id)
}
