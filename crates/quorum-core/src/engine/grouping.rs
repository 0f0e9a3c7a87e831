//! Greedy similarity grouping used by consensus merging
//!
//! Each suggestion is compared only with the first member of every existing
//! group, in group order, and joins the first group it is similar enough to.
//! The result depends on input order and is not transitive: a suggestion close
//! to a later member but not to the first one opens its own group.

use super::similarity::WordSet;
use crate::config::DEFAULT_GROUPING_THRESHOLD;
use crate::models::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grouper {
    threshold: f64,
}

impl Default for Grouper {
    fn default() -> Self {
        Self::new(DEFAULT_GROUPING_THRESHOLD)
    }
}

impl Grouper {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Partition `suggestions` into non-empty groups, preserving input order
    /// inside each group.
    pub fn group<'a>(&self, suggestions: &'a [Suggestion]) -> Vec<Vec<&'a Suggestion>> {
        let mut groups: Vec<(WordSet, Vec<&'a Suggestion>)> = Vec::new();

        for suggestion in suggestions {
            let words = WordSet::new(&suggestion.content);
            let matching = groups
                .iter_mut()
                .find(|(leader, _)| words.jaccard(leader) > self.threshold);

            match matching {
                Some((_, members)) => members.push(suggestion),
                None => groups.push((words, vec![suggestion])),
            }
        }

        groups.into_iter().map(|(_, members)| members).collect()
    }
}

/// Group with the default threshold
pub fn group(suggestions: &[Suggestion]) -> Vec<Vec<&Suggestion>> {
    Grouper::default().group(suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdeaId, SuggestionId, SuggestionKind, UserId};
    use std::collections::HashSet;

    fn batch(texts: &[&str]) -> Vec<Suggestion> {
        let idea = IdeaId::new();
        texts
            .iter()
            .map(|text| Suggestion::new(idea, UserId::new(), *text, SuggestionKind::General))
            .collect()
    }

    fn contents(groups: &[Vec<&Suggestion>]) -> Vec<Vec<String>> {
        groups
            .iter()
            .map(|members| members.iter().map(|s| s.content.clone()).collect())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(group(&[]).is_empty());
    }

    #[test]
    fn test_partition_covers_every_suggestion_once() {
        let suggestions = batch(&[
            "add dark mode",
            "add dark mode please",
            "export to pdf",
            "add dark mode now",
            "export to pdf files",
            "nothing alike",
        ]);

        let groups = group(&suggestions);
        assert!(groups.iter().all(|members| !members.is_empty()));

        let seen: Vec<SuggestionId> = groups.iter().flatten().map(|s| s.id).collect();
        let unique: HashSet<_> = seen.iter().collect();
        assert_eq!(seen.len(), suggestions.len());
        assert_eq!(unique.len(), suggestions.len());
    }

    #[test]
    fn test_groups_follow_input_order() {
        let suggestions = batch(&[
            "add dark mode",
            "export to pdf",
            "add dark mode please",
            "export to pdf files",
        ]);

        assert_eq!(
            contents(&group(&suggestions)),
            vec![
                vec!["add dark mode", "add dark mode please"],
                vec!["export to pdf", "export to pdf files"],
            ]
        );
    }

    #[test]
    fn test_only_first_member_is_compared() {
        // "a b c d e" is the leader; "a b c d e f" joins (5/6).
        // "b c d e f g" is close to the second member (5/7) but not the
        // leader (4/7), so it starts its own group.
        let suggestions = batch(&["a b c d e", "a b c d e f", "b c d e f g"]);

        let groups = group(&suggestions);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1][0].content, "b c d e f g");
    }

    #[test]
    fn test_joins_first_matching_group() {
        let suggestions = batch(&["x y z w", "x y z v", "x y z"]);
        // "x y z w" vs "x y z v" = 3/5, not above 0.6: two groups.
        // "x y z" matches both leaders at 3/4 and joins the first.
        let groups = group(&suggestions);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][1].content, "x y z");
    }
}
