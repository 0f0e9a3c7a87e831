//! Merge recommendations for the pending suggestions of an idea

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::grouping::Grouper;
use super::strategy::ReputationLookup;
use crate::models::{ConflictDescriptor, MergeStrategy, Suggestion, SuggestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ConsensusMerge,
    PriorityMerge,
    ConflictResolution,
    AutoMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// A proposed next step for the idea owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub priority: RecommendationPriority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestion_ids: Vec<SuggestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MergeStrategy>,
    #[serde(default)]
    pub auto_merge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_required: Option<String>,
}

/// Builds [`Recommendation`]s from a pending batch and its detected conflicts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recommender {
    grouper: Grouper,
    high_reputation_points: i64,
}

impl Recommender {
    pub const fn new(grouper: Grouper, high_reputation_points: i64) -> Self {
        Self {
            grouper,
            high_reputation_points,
        }
    }

    pub fn recommend(
        &self,
        pending: &[Suggestion],
        conflicts: &[ConflictDescriptor],
        reputation: &impl ReputationLookup,
    ) -> Vec<Recommendation> {
        if pending.len() < 2 {
            return Vec::new();
        }

        let mut recommendations = Vec::new();

        let large_groups: Vec<_> = self
            .grouper
            .group(pending)
            .into_iter()
            .filter(|members| members.len() >= 2)
            .collect();
        if !large_groups.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ConsensusMerge,
                title: "Merge Similar Suggestions".to_string(),
                description: format!(
                    "Found {} groups of similar suggestions that can be consolidated",
                    large_groups.len()
                ),
                priority: RecommendationPriority::High,
                suggestion_ids: large_groups.iter().flatten().map(|s| s.id).collect(),
                strategy: Some(MergeStrategy::Consensus),
                auto_merge: false,
                action_required: None,
            });
        }

        let trusted: Vec<SuggestionId> = pending
            .iter()
            .filter(|s| reputation.points_for(&s.author_id) > self.high_reputation_points)
            .map(|s| s.id)
            .collect();
        if trusted.len() >= 3 {
            recommendations.push(Recommendation {
                kind: RecommendationKind::PriorityMerge,
                title: "Priority-Based Merge".to_string(),
                description: "Merge suggestions from high-reputation contributors first"
                    .to_string(),
                priority: RecommendationPriority::Medium,
                suggestion_ids: trusted,
                strategy: Some(MergeStrategy::Priority),
                auto_merge: false,
                action_required: None,
            });
        }

        if !conflicts.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ConflictResolution,
                title: "Resolve Conflicts First".to_string(),
                description: format!(
                    "Found {} conflicts that need resolution before merging",
                    conflicts.len()
                ),
                priority: RecommendationPriority::High,
                suggestion_ids: Vec::new(),
                strategy: None,
                auto_merge: false,
                action_required: Some("resolve_conflicts".to_string()),
            });
        }

        let conflicting: HashSet<SuggestionId> = conflicts
            .iter()
            .filter_map(ConflictDescriptor::pair)
            .flat_map(|(first, second)| [first, second])
            .collect();
        let safe: Vec<SuggestionId> = pending
            .iter()
            .map(|s| s.id)
            .filter(|id| !conflicting.contains(id))
            .collect();
        if safe.len() >= 2 {
            recommendations.push(Recommendation {
                kind: RecommendationKind::AutoMerge,
                title: "Auto-Merge Safe Suggestions".to_string(),
                description: "Automatically merge suggestions that don't conflict with each other"
                    .to_string(),
                priority: RecommendationPriority::Low,
                suggestion_ids: safe,
                strategy: None,
                auto_merge: true,
                action_required: None,
            });
        }

        recommendations
    }
}
