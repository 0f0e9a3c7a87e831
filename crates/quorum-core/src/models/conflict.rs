//! Conflict descriptors and the durable conflict ledger entry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ConflictId, IdeaId, SuggestionId, UserId};
use crate::error::{Error, Result};

pub const CONTENT_OVERLAP_DESCRIPTION: &str =
    "Suggestions have similar content that may be redundant";
pub const LOGICAL_CONFLICT_DESCRIPTION: &str =
    "Conflicting suggestions: some suggest positive changes while others suggest removal/reduction";

/// Kind of detected tension between suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ContentOverlap,
    LogicalConflict,
}

impl ConflictKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentOverlap => "content_overlap",
            Self::LogicalConflict => "logical_conflict",
        }
    }
}

impl FromStr for ConflictKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "content_overlap" => Ok(Self::ContentOverlap),
            "logical_conflict" => Ok(Self::LogicalConflict),
            other => Err(Error::InvalidInput(format!("unknown conflict type '{other}'"))),
        }
    }
}

/// Detector output, before anything is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictDescriptor {
    /// Two suggestions whose content overlaps above the threshold
    ContentOverlap {
        first: SuggestionId,
        second: SuggestionId,
        similarity: f64,
        description: String,
    },
    /// The batch mixes additive and subtractive suggestions
    LogicalConflict {
        positive_count: usize,
        negative_count: usize,
        description: String,
    },
}

impl ConflictDescriptor {
    pub const fn kind(&self) -> ConflictKind {
        match self {
            Self::ContentOverlap { .. } => ConflictKind::ContentOverlap,
            Self::LogicalConflict { .. } => ConflictKind::LogicalConflict,
        }
    }

    /// Participants of a pairwise descriptor
    pub const fn pair(&self) -> Option<(SuggestionId, SuggestionId)> {
        match self {
            Self::ContentOverlap { first, second, .. } => Some((*first, *second)),
            Self::LogicalConflict { .. } => None,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::ContentOverlap { description, .. } | Self::LogicalConflict { description, .. } => {
                description
            }
        }
    }
}

/// Resolution lifecycle of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    #[default]
    Unresolved,
    Resolved,
    Ignored,
}

impl ResolutionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unresolved" => Ok(Self::Unresolved),
            "resolved" => Ok(Self::Resolved),
            "ignored" => Ok(Self::Ignored),
            other => Err(Error::InvalidInput(format!(
                "unknown resolution status '{other}'"
            ))),
        }
    }
}

/// Durable conflict record between two suggestions of an idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionConflict {
    pub id: ConflictId,
    pub idea_id: IdeaId,
    pub suggestion_1_id: SuggestionId,
    pub suggestion_2_id: SuggestionId,
    pub conflict_type: ConflictKind,
    /// Field the conflict is about, when narrower than the whole content
    pub field_name: Option<String>,
    pub description: String,
    /// Values backing the conflict, e.g. `{"similarity": 0.8}`
    pub conflicting_values: serde_json::Value,
    pub resolution_status: ResolutionStatus,
    pub resolved_by: Option<UserId>,
    pub resolution_notes: Option<String>,
    /// Resolution timestamp (Unix ms)
    pub resolved_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl SuggestionConflict {
    /// Build a ledger entry from a pairwise descriptor.
    ///
    /// Batch-level descriptors have no participants and yield `None`.
    pub fn from_descriptor(idea_id: IdeaId, descriptor: &ConflictDescriptor) -> Option<Self> {
        let ConflictDescriptor::ContentOverlap {
            first,
            second,
            similarity,
            description,
        } = descriptor
        else {
            return None;
        };

        Some(Self {
            id: ConflictId::new(),
            idea_id,
            suggestion_1_id: *first,
            suggestion_2_id: *second,
            conflict_type: ConflictKind::ContentOverlap,
            field_name: None,
            description: description.clone(),
            conflicting_values: serde_json::json!({ "similarity": similarity }),
            resolution_status: ResolutionStatus::Unresolved,
            resolved_by: None,
            resolution_notes: None,
            resolved_at: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution_status == ResolutionStatus::Resolved
    }

    pub fn is_open(&self) -> bool {
        self.resolution_status == ResolutionStatus::Unresolved
    }

    /// Close the conflict as `resolved` or `ignored`.
    pub fn close(
        &mut self,
        status: ResolutionStatus,
        actor: UserId,
        notes: Option<String>,
        at: i64,
    ) -> Result<()> {
        if status == ResolutionStatus::Unresolved {
            return Err(Error::InvalidInput(
                "a conflict cannot be reopened".to_string(),
            ));
        }
        if !self.is_open() {
            return Err(Error::AlreadyResolved(self.id));
        }
        self.resolution_status = status;
        self.resolved_by = Some(actor);
        self.resolution_notes = notes;
        self.resolved_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap() -> ConflictDescriptor {
        ConflictDescriptor::ContentOverlap {
            first: SuggestionId::new(),
            second: SuggestionId::new(),
            similarity: 0.8,
            description: CONTENT_OVERLAP_DESCRIPTION.to_string(),
        }
    }

    #[test]
    fn test_from_descriptor_only_for_pairs() {
        let idea = IdeaId::new();
        let logical = ConflictDescriptor::LogicalConflict {
            positive_count: 1,
            negative_count: 1,
            description: LOGICAL_CONFLICT_DESCRIPTION.to_string(),
        };
        assert!(SuggestionConflict::from_descriptor(idea, &logical).is_none());

        let descriptor = overlap();
        let conflict = SuggestionConflict::from_descriptor(idea, &descriptor).unwrap();
        assert_eq!(
            Some((conflict.suggestion_1_id, conflict.suggestion_2_id)),
            descriptor.pair()
        );
        assert_eq!(conflict.conflicting_values["similarity"], 0.8);
        assert!(conflict.is_open());
    }

    #[test]
    fn test_close_is_irreversible() {
        let mut conflict = SuggestionConflict::from_descriptor(IdeaId::new(), &overlap()).unwrap();
        let actor = UserId::new();
        conflict
            .close(ResolutionStatus::Resolved, actor, Some("kept first".into()), 42)
            .unwrap();
        assert!(conflict.is_resolved());
        assert_eq!(conflict.resolved_by, Some(actor));

        let err = conflict
            .close(ResolutionStatus::Ignored, UserId::new(), None, 43)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved(_)));
        assert_eq!(conflict.resolution_notes.as_deref(), Some("kept first"));
        assert_eq!(conflict.resolved_at, Some(42));
    }

    #[test]
    fn test_descriptor_serializes_with_type_tag() {
        let json = serde_json::to_value(overlap()).unwrap();
        assert_eq!(json["type"], "content_overlap");
        assert_eq!(json["similarity"], 0.8);
    }
}
