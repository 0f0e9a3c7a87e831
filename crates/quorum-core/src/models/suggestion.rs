//! Suggestion model and its acceptance lifecycle

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{IdeaId, MergeId, SuggestionId, UserId};
use crate::error::{Error, Result};

/// Kind of feedback a suggestion carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Improvement,
    Question,
    Concern,
    Support,
    #[default]
    General,
}

impl SuggestionKind {
    pub const ALL: [Self; 5] = [
        Self::Improvement,
        Self::Question,
        Self::Concern,
        Self::Support,
        Self::General,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::Question => "question",
            Self::Concern => "concern",
            Self::Support => "support",
            Self::General => "general",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuggestionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown suggestion type '{s}'")))
    }
}

/// Acceptance state of a suggestion
///
/// `Accepted` and `Rejected` are terminal. A suggestion swept into a merge is
/// `Accepted` with `merged_into` pointing at the merge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SuggestionState {
    Pending,
    Accepted {
        accepted_by: UserId,
        accepted_at: i64,
        merged_into: Option<MergeId>,
    },
    Rejected {
        rejected_at: i64,
    },
}

impl SuggestionState {
    /// Storage/display name of the state
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Accepted as a side effect of a merge
    pub const fn is_merged(&self) -> bool {
        matches!(
            self,
            Self::Accepted {
                merged_into: Some(_),
                ..
            }
        )
    }
}

/// A single piece of feedback proposed against an idea
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Unique identifier
    pub id: SuggestionId,
    /// Idea this suggestion belongs to
    pub idea_id: IdeaId,
    /// Contributor who wrote it
    pub author_id: UserId,
    /// Parent suggestion when this is a threaded reply
    pub parent_id: Option<SuggestionId>,
    /// Free-text content
    pub content: String,
    /// Type tag
    pub kind: SuggestionKind,
    /// Acceptance state
    pub state: SuggestionState,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Suggestion {
    /// Create a new pending suggestion
    #[must_use]
    pub fn new(
        idea_id: IdeaId,
        author_id: UserId,
        content: impl Into<String>,
        kind: SuggestionKind,
    ) -> Self {
        Self {
            id: SuggestionId::new(),
            idea_id,
            author_id,
            parent_id: None,
            content: content.into(),
            kind,
            state: SuggestionState::Pending,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Attach this suggestion as a reply to `parent`
    #[must_use]
    pub const fn with_parent(mut self, parent: SuggestionId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub const fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub const fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Accept the suggestion individually
    pub fn accept(&mut self, by: UserId, at: i64) -> Result<()> {
        self.transition(
            SuggestionState::Accepted {
                accepted_by: by,
                accepted_at: at,
                merged_into: None,
            },
        )
    }

    /// Reject the suggestion
    pub fn reject(&mut self, at: i64) -> Result<()> {
        self.transition(SuggestionState::Rejected { rejected_at: at })
    }

    /// Mark the suggestion as consumed by `merge`
    pub fn mark_merged(&mut self, by: UserId, merge: MergeId, at: i64) -> Result<()> {
        self.transition(SuggestionState::Accepted {
            accepted_by: by,
            accepted_at: at,
            merged_into: Some(merge),
        })
    }

    fn transition(&mut self, next: SuggestionState) -> Result<()> {
        if !self.state.is_pending() {
            return Err(Error::InvalidTransition {
                id: self.id,
                from: self.state.name(),
                to: next.name(),
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion() -> Suggestion {
        Suggestion::new(
            IdeaId::new(),
            UserId::new(),
            "Add dark mode",
            SuggestionKind::Improvement,
        )
    }

    #[test]
    fn test_new_suggestion_is_pending() {
        let s = suggestion();
        assert!(s.is_pending());
        assert!(!s.is_reply());
        assert!(s.created_at > 0);
    }

    #[test]
    fn test_accept_then_reject_is_rejected() {
        let mut s = suggestion();
        let by = UserId::new();
        s.accept(by, 10).unwrap();
        assert_eq!(
            s.state,
            SuggestionState::Accepted {
                accepted_by: by,
                accepted_at: 10,
                merged_into: None
            }
        );

        let err = s.reject(11).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: "accepted",
                to: "rejected",
                ..
            }
        ));
    }

    #[test]
    fn test_rejected_cannot_be_merged() {
        let mut s = suggestion();
        s.reject(5).unwrap();
        assert!(s.mark_merged(UserId::new(), MergeId::new(), 6).is_err());
        assert_eq!(s.state, SuggestionState::Rejected { rejected_at: 5 });
    }

    #[test]
    fn test_mark_merged_distinguishes_from_plain_accept() {
        let mut merged = suggestion();
        merged
            .mark_merged(UserId::new(), MergeId::new(), 1)
            .unwrap();
        assert!(merged.state.is_merged());

        let mut accepted = suggestion();
        accepted.accept(UserId::new(), 1).unwrap();
        assert!(!accepted.state.is_merged());
        assert_eq!(accepted.state.name(), merged.state.name());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(
            "Concern".parse::<SuggestionKind>().unwrap(),
            SuggestionKind::Concern
        );
        assert!("rant".parse::<SuggestionKind>().is_err());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(SuggestionState::Pending).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "pending" }));
    }
}
