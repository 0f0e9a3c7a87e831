//! Data models for Quorum

mod conflict;
mod idea;
mod ids;
mod merge;
mod points;
mod suggestion;

pub use conflict::{
    ConflictDescriptor, ConflictKind, ResolutionStatus, SuggestionConflict,
    CONTENT_OVERLAP_DESCRIPTION, LOGICAL_CONFLICT_DESCRIPTION,
};
pub use idea::Idea;
pub use ids::{ConflictId, IdeaId, MergeId, SuggestionId, UserId};
pub use merge::{merge_summary, Change, MergeOptions, MergeStrategy, MergeType, SuggestionMerge};
pub use points::{PointsEntry, PointsEvent};
pub use suggestion::{Suggestion, SuggestionKind, SuggestionState};
