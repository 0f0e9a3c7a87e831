//! Merge strategies, change entries and the merge audit record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{IdeaId, MergeId, SuggestionId, UserId};
use crate::error::{Error, Result};

/// Rule used to pick which content survives a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Keep content that several similar suggestions agree on
    #[default]
    Consensus,
    /// Keep suggestions from the highest-reputation authors
    Priority,
    /// Keep the most recent suggestions
    Latest,
}

impl MergeStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Consensus => "consensus",
            Self::Priority => "priority",
            Self::Latest => "latest",
        }
    }

    /// Select a strategy by exact name; anything else means `consensus`.
    pub fn parse_lenient(name: &str) -> Self {
        match name {
            "consensus" => Self::Consensus,
            "priority" => Self::Priority,
            "latest" => Self::Latest,
            other => {
                tracing::debug!(strategy = other, "Unknown merge strategy, using consensus");
                Self::Consensus
            }
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the merge was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeType {
    Auto,
    #[default]
    Manual,
}

impl MergeType {
    pub const fn from_auto_merge(auto_merge: bool) -> Self {
        if auto_merge {
            Self::Auto
        } else {
            Self::Manual
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for MergeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            other => Err(Error::InvalidInput(format!("unknown merge type '{other}'"))),
        }
    }
}

/// One consolidated content fragment produced by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Change {
    #[serde(rename = "consensus_change")]
    Consensus {
        content: String,
        support_count: usize,
        authors: Vec<UserId>,
    },
    #[serde(rename = "priority_change")]
    Priority {
        content: String,
        author: UserId,
        author_points: i64,
    },
    #[serde(rename = "latest_change")]
    Latest {
        content: String,
        created_at: i64,
        author: UserId,
    },
}

impl Change {
    pub fn content(&self) -> &str {
        match self {
            Self::Consensus { content, .. }
            | Self::Priority { content, .. }
            | Self::Latest { content, .. } => content,
        }
    }
}

/// Caller-supplied knobs for a merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    #[serde(default)]
    pub strategy: MergeStrategy,
    #[serde(default)]
    pub auto_merge: bool,
    /// Stored verbatim on the merge record
    #[serde(default)]
    pub conflict_resolution: Option<serde_json::Value>,
}

impl MergeOptions {
    #[must_use]
    pub fn with_strategy_name(mut self, name: &str) -> Self {
        self.strategy = MergeStrategy::parse_lenient(name);
        self
    }

    #[must_use]
    pub const fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub const fn auto(mut self, auto_merge: bool) -> Self {
        self.auto_merge = auto_merge;
        self
    }

    #[must_use]
    pub fn with_conflict_resolution(mut self, payload: serde_json::Value) -> Self {
        self.conflict_resolution = Some(payload);
        self
    }
}

/// Immutable audit record of one merge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMerge {
    pub id: MergeId,
    pub idea_id: IdeaId,
    pub merged_by: UserId,
    /// Consumed suggestions, in the order they were supplied
    pub merged_suggestions: Vec<SuggestionId>,
    pub merge_summary: String,
    pub changes_applied: Vec<Change>,
    pub merge_type: MergeType,
    /// Whether the analysis run for this merge found any conflict
    pub has_conflicts: bool,
    pub conflict_resolution: Option<serde_json::Value>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

/// Human-readable summary stored on the merge record
pub fn merge_summary(suggestion_count: usize, change_count: usize) -> String {
    format!("Merged {suggestion_count} suggestions into {change_count} consolidated changes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_falls_back_to_consensus() {
        assert_eq!(MergeStrategy::parse_lenient("latest"), MergeStrategy::Latest);
        assert_eq!(MergeStrategy::parse_lenient("priority"), MergeStrategy::Priority);
        assert_eq!(MergeStrategy::parse_lenient("Latest"), MergeStrategy::Consensus);
        assert_eq!(MergeStrategy::parse_lenient("vote"), MergeStrategy::Consensus);
    }

    #[test]
    fn test_merge_type_from_flag() {
        assert_eq!(MergeType::from_auto_merge(true), MergeType::Auto);
        assert_eq!(MergeType::from_auto_merge(false), MergeType::Manual);
    }

    #[test]
    fn test_summary_format() {
        assert_eq!(
            merge_summary(4, 1),
            "Merged 4 suggestions into 1 consolidated changes"
        );
    }

    #[test]
    fn test_change_tagged_serialization() {
        let author = UserId::new();
        let change = Change::Latest {
            content: "Ship it".into(),
            created_at: 7,
            author,
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["type"], "latest_change");
        assert_eq!(json["created_at"], 7);

        let back: Change = serde_json::from_value(json).unwrap();
        assert_eq!(back, change);
    }
}
