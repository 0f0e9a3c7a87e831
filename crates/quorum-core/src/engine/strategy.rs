//! Merge strategies: turn a batch of suggestions into consolidated changes

use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::BuildHasher;

use super::grouping::Grouper;
use crate::config::{DEFAULT_LATEST_LIMIT, DEFAULT_PRIORITY_LIMIT};
use crate::models::{Change, MergeStrategy, Suggestion, UserId};

/// Author reputation source used by the `priority` strategy
pub trait ReputationLookup {
    /// Total points awarded to `author`
    fn points_for(&self, author: &UserId) -> i64;
}

/// Snapshot of point totals; unknown authors have no points.
impl<S: BuildHasher> ReputationLookup for HashMap<UserId, i64, S> {
    fn points_for(&self, author: &UserId) -> i64 {
        self.get(author).copied().unwrap_or(0)
    }
}

/// Reputation source that knows nobody
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReputation;

impl ReputationLookup for NoReputation {
    fn points_for(&self, _author: &UserId) -> i64 {
        0
    }
}

/// Applies a [`MergeStrategy`] to a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySelector {
    grouper: Grouper,
    priority_limit: usize,
    latest_limit: usize,
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(Grouper::default(), DEFAULT_PRIORITY_LIMIT, DEFAULT_LATEST_LIMIT)
    }
}

impl StrategySelector {
    pub const fn new(grouper: Grouper, priority_limit: usize, latest_limit: usize) -> Self {
        Self {
            grouper,
            priority_limit,
            latest_limit,
        }
    }

    /// Ordered changes for `strategy`. Input suggestions are left untouched.
    pub fn apply(
        &self,
        suggestions: &[Suggestion],
        strategy: MergeStrategy,
        reputation: &impl ReputationLookup,
    ) -> Vec<Change> {
        match strategy {
            MergeStrategy::Consensus => self.consensus(suggestions),
            MergeStrategy::Priority => self.priority(suggestions, reputation),
            MergeStrategy::Latest => self.latest(suggestions),
        }
    }

    fn consensus(&self, suggestions: &[Suggestion]) -> Vec<Change> {
        self.grouper
            .group(suggestions)
            .into_iter()
            .filter(|members| members.len() >= 2)
            .map(|members| Change::Consensus {
                content: members[0].content.clone(),
                support_count: members.len(),
                authors: members.iter().map(|member| member.author_id).collect(),
            })
            .collect()
    }

    fn priority(
        &self,
        suggestions: &[Suggestion],
        reputation: &impl ReputationLookup,
    ) -> Vec<Change> {
        let mut ranked: Vec<(&Suggestion, i64)> = suggestions
            .iter()
            .map(|suggestion| (suggestion, reputation.points_for(&suggestion.author_id)))
            .collect();
        // stable: equal totals keep input order
        ranked.sort_by_key(|(_, points)| Reverse(*points));

        ranked
            .into_iter()
            .take(self.priority_limit)
            .map(|(suggestion, author_points)| Change::Priority {
                content: suggestion.content.clone(),
                author: suggestion.author_id,
                author_points,
            })
            .collect()
    }

    fn latest(&self, suggestions: &[Suggestion]) -> Vec<Change> {
        let mut ordered: Vec<&Suggestion> = suggestions.iter().collect();
        ordered.sort_by_key(|suggestion| Reverse(suggestion.created_at));

        ordered
            .into_iter()
            .take(self.latest_limit)
            .map(|suggestion| Change::Latest {
                content: suggestion.content.clone(),
                created_at: suggestion.created_at,
                author: suggestion.author_id,
            })
            .collect()
    }
}

/// Apply `strategy` with the default grouping threshold and limits
pub fn apply(
    suggestions: &[Suggestion],
    strategy: MergeStrategy,
    reputation: &impl ReputationLookup,
) -> Vec<Change> {
    StrategySelector::default().apply(suggestions, strategy, reputation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdeaId, SuggestionKind};
    use pretty_assertions::assert_eq;

    fn suggestion(idea: IdeaId, author: UserId, text: &str, created_at: i64) -> Suggestion {
        let mut suggestion = Suggestion::new(idea, author, text, SuggestionKind::Improvement);
        suggestion.created_at = created_at;
        suggestion
    }

    fn batch(texts: &[&str]) -> Vec<Suggestion> {
        let idea = IdeaId::new();
        texts
            .iter()
            .zip(1..)
            .map(|(text, ts)| suggestion(idea, UserId::new(), text, ts))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_changes() {
        for strategy in [
            MergeStrategy::Consensus,
            MergeStrategy::Priority,
            MergeStrategy::Latest,
        ] {
            assert!(apply(&[], strategy, &NoReputation).is_empty());
        }
    }

    #[test]
    fn test_consensus_identical_pair() {
        let suggestions = batch(&["Add offline mode", "Add offline mode"]);

        let changes = apply(&suggestions, MergeStrategy::Consensus, &NoReputation);
        assert_eq!(
            changes,
            vec![Change::Consensus {
                content: "Add offline mode".to_string(),
                support_count: 2,
                authors: vec![suggestions[0].author_id, suggestions[1].author_id],
            }]
        );
    }

    #[test]
    fn test_consensus_skips_singletons() {
        let suggestions = batch(&[
            "add dark mode",
            "export to pdf",
            "add dark mode please",
            "unrelated remark",
        ]);

        let changes = apply(&suggestions, MergeStrategy::Consensus, &NoReputation);
        assert_eq!(changes.len(), 1);
        assert!(changes.iter().all(|change| matches!(
            change,
            Change::Consensus { support_count, .. } if *support_count >= 2
        )));
        assert_eq!(changes[0].content(), "add dark mode");
    }

    #[test]
    fn test_priority_ranks_by_reputation_and_caps_at_three() {
        let suggestions = batch(&["one", "two", "three", "four", "five"]);
        let reputation: HashMap<UserId, i64> = [
            (suggestions[0].author_id, 10),
            (suggestions[1].author_id, 50),
            (suggestions[3].author_id, 50),
            (suggestions[4].author_id, 90),
        ]
        .into_iter()
        .collect();

        let changes = apply(&suggestions, MergeStrategy::Priority, &reputation);
        let picked: Vec<(&str, i64)> = changes
            .iter()
            .map(|change| match change {
                Change::Priority {
                    content,
                    author_points,
                    ..
                } => (content.as_str(), *author_points),
                other => panic!("unexpected change {other:?}"),
            })
            .collect();

        // ties between "two" and "four" keep input order
        assert_eq!(picked, vec![("five", 90), ("two", 50), ("four", 50)]);
    }

    #[test]
    fn test_latest_orders_by_timestamp_and_caps_at_five() {
        let idea = IdeaId::new();
        let author = UserId::new();
        let suggestions: Vec<Suggestion> = [30, 10, 60, 20, 50, 40]
            .into_iter()
            .map(|ts| suggestion(idea, author, &format!("at {ts}"), ts))
            .collect();

        let changes = apply(&suggestions, MergeStrategy::Latest, &NoReputation);
        let stamps: Vec<i64> = changes
            .iter()
            .map(|change| match change {
                Change::Latest { created_at, .. } => *created_at,
                other => panic!("unexpected change {other:?}"),
            })
            .collect();
        assert_eq!(stamps, vec![60, 50, 40, 30, 20]);
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let suggestions = batch(&["b", "a", "c"]);
        let before = suggestions.clone();
        let _ = apply(&suggestions, MergeStrategy::Latest, &NoReputation);
        let _ = apply(&suggestions, MergeStrategy::Priority, &NoReputation);
        assert_eq!(suggestions, before);
    }

    #[test]
    fn test_custom_limits() {
        let selector = StrategySelector::new(Grouper::default(), 1, 2);
        let suggestions = batch(&["a", "b", "c"]);
        assert_eq!(
            selector
                .apply(&suggestions, MergeStrategy::Priority, &NoReputation)
                .len(),
            1
        );
        assert_eq!(
            selector
                .apply(&suggestions, MergeStrategy::Latest, &NoReputation)
                .len(),
            2
        );
    }
}
