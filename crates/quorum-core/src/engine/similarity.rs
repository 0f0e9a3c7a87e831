//! Lexical similarity between suggestion texts

#![allow(clippy::cast_precision_loss)] // word counts are far below 2^52

use std::collections::HashSet;

/// Set of unique lower-cased, whitespace-delimited words of a text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordSet(HashSet<String>);

impl WordSet {
    pub fn new(text: &str) -> Self {
        Self(
            text.to_lowercase()
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Jaccard index of the two sets; two empty sets score 0.
    pub fn jaccard(&self, other: &Self) -> f64 {
        let union = self.0.union(&other.0).count();
        if union == 0 {
            return 0.0;
        }
        let intersection = self.0.intersection(&other.0).count();
        intersection as f64 / union as f64
    }
}

/// Symmetric word-overlap score of two texts in `[0, 1]`
///
/// # Examples
///
/// ```
/// use quorum_core::engine::similarity;
///
/// assert_eq!(similarity("Add search", "add SEARCH"), 1.0);
/// assert_eq!(similarity("", ""), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    WordSet::new(a).jaccard(&WordSet::new(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_one() {
        assert!((similarity("add a search bar", "add a search bar") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert!(similarity("add dark mode", "remove export button").abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_texts_score_zero_not_nan() {
        let score = similarity("", "   ");
        assert!(!score.is_nan());
        assert!(score.abs() < f64::EPSILON);
        assert!(similarity("", "something").abs() < f64::EPSILON);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("Please add a search filter", "We should add search filters too"),
            ("one two three", "three four"),
            ("", "x"),
        ];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_case_and_duplicates_collapse() {
        // {add, search} vs {add, search, bar}
        let score = similarity("Add add SEARCH", "add search bar");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_word_set_counts_unique_words() {
        let words = WordSet::new("a b  a\tB\n");
        assert_eq!(words.len(), 2);
        assert!(WordSet::new(" \n").is_empty());
    }
}
