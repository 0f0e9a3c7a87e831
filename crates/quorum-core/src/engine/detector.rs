//! Conflict detection over a batch of suggestions

use super::similarity::WordSet;
use crate::config::DEFAULT_OVERLAP_THRESHOLD;
use crate::models::{
    ConflictDescriptor, Suggestion, CONTENT_OVERLAP_DESCRIPTION, LOGICAL_CONFLICT_DESCRIPTION,
};

const POSITIVE_WORDS: [&str; 7] = [
    "add",
    "include",
    "implement",
    "create",
    "increase",
    "expand",
    "enhance",
];
const NEGATIVE_WORDS: [&str; 5] = ["remove", "delete", "reduce", "eliminate", "exclude"];

/// Direction a suggestion pushes the idea in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Additive
    Positive,
    /// Subtractive, or no clear lean
    Negative,
}

/// Classify content by the lexicon words it contains.
///
/// Each lexicon word counts once when it appears anywhere in the lower-cased
/// content. Only a strict positive majority is `Positive`.
pub fn polarity(content: &str) -> Polarity {
    let content = content.to_lowercase();
    let count = |words: &[&str]| words.iter().filter(|word| content.contains(*word)).count();

    if count(&POSITIVE_WORDS) > count(&NEGATIVE_WORDS) {
        Polarity::Positive
    } else {
        Polarity::Negative
    }
}

/// Finds content overlaps and polarity contradictions in a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictDetector {
    overlap_threshold: f64,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_THRESHOLD)
    }
}

impl ConflictDetector {
    pub const fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    /// Pairwise overlaps in evaluation order, then at most one logical conflict.
    pub fn detect(&self, suggestions: &[Suggestion]) -> Vec<ConflictDescriptor> {
        let mut conflicts = self.content_overlaps(suggestions);
        conflicts.extend(logical_conflict(suggestions));

        tracing::debug!(
            suggestions = suggestions.len(),
            conflicts = conflicts.len(),
            "Analyzed suggestions for conflicts"
        );
        conflicts
    }

    fn content_overlaps(&self, suggestions: &[Suggestion]) -> Vec<ConflictDescriptor> {
        let words: Vec<WordSet> = suggestions
            .iter()
            .map(|suggestion| WordSet::new(&suggestion.content))
            .collect();

        let mut conflicts = Vec::new();
        for (i, first) in suggestions.iter().enumerate() {
            for (j, second) in suggestions.iter().enumerate().skip(i + 1) {
                let similarity = words[i].jaccard(&words[j]);
                if similarity > self.overlap_threshold {
                    conflicts.push(ConflictDescriptor::ContentOverlap {
                        first: first.id,
                        second: second.id,
                        similarity,
                        description: CONTENT_OVERLAP_DESCRIPTION.to_string(),
                    });
                }
            }
        }
        conflicts
    }
}

fn logical_conflict(suggestions: &[Suggestion]) -> Option<ConflictDescriptor> {
    let positive_count = suggestions
        .iter()
        .filter(|suggestion| polarity(&suggestion.content) == Polarity::Positive)
        .count();
    let negative_count = suggestions.len() - positive_count;

    (positive_count > 0 && negative_count > 0).then(|| ConflictDescriptor::LogicalConflict {
        positive_count,
        negative_count,
        description: LOGICAL_CONFLICT_DESCRIPTION.to_string(),
    })
}

/// Detect conflicts with the default overlap threshold
pub fn detect(suggestions: &[Suggestion]) -> Vec<ConflictDescriptor> {
    ConflictDetector::default().detect(suggestions)
}
