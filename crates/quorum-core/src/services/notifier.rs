//! Post-commit notification hook

use crate::models::{SuggestionConflict, SuggestionMerge};

/// Receives merge and resolution outcomes once they are committed.
///
/// Implementations must not fail the operation; delivery problems are theirs
/// to log.
pub trait MergeNotifier: Send + Sync {
    fn merge_completed(&self, merge: &SuggestionMerge);

    fn conflict_closed(&self, conflict: &SuggestionConflict);
}

/// Emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl MergeNotifier for TracingNotifier {
    fn merge_completed(&self, merge: &SuggestionMerge) {
        tracing::info!(
            merge = %merge.id,
            idea = %merge.idea_id,
            merged_by = %merge.merged_by,
            suggestions = merge.merged_suggestions.len(),
            changes = merge.changes_applied.len(),
            has_conflicts = merge.has_conflicts,
            "Suggestions merged"
        );
    }

    fn conflict_closed(&self, conflict: &SuggestionConflict) {
        tracing::info!(
            conflict = %conflict.id,
            idea = %conflict.idea_id,
            status = %conflict.resolution_status,
            "Conflict closed"
        );
    }
}
