//! Pure merge engine: similarity, conflict detection, grouping, strategies.
//!
//! Nothing in here touches storage. Every function is total over its inputs
//! and safe to call from any thread.

mod detector;
mod grouping;
mod recommend;
mod similarity;
mod strategy;

pub use detector::{detect, polarity, ConflictDetector, Polarity};
pub use grouping::{group, Grouper};
pub use recommend::{Recommendation, RecommendationKind, RecommendationPriority, Recommender};
pub use similarity::{similarity, WordSet};
pub use strategy::{apply, NoReputation, ReputationLookup, StrategySelector};

use crate::config::MergeConfig;
use crate::models::{Change, ConflictDescriptor, MergeStrategy, Suggestion};

/// Engine components wired from one [`MergeConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEngine {
    detector: ConflictDetector,
    selector: StrategySelector,
    recommender: Recommender,
}

impl Default for MergeEngine {
    fn default() -> Self {
        Self::from_config(&MergeConfig::default())
    }
}

impl MergeEngine {
    pub fn from_config(config: &MergeConfig) -> Self {
        let grouper = Grouper::new(config.grouping_threshold);
        Self {
            detector: ConflictDetector::new(config.overlap_threshold),
            selector: StrategySelector::new(grouper, config.priority_limit, config.latest_limit),
            recommender: Recommender::new(grouper, config.high_reputation_points),
        }
    }

    pub fn detect(&self, suggestions: &[Suggestion]) -> Vec<ConflictDescriptor> {
        self.detector.detect(suggestions)
    }

    pub fn apply(
        &self,
        suggestions: &[Suggestion],
        strategy: MergeStrategy,
        reputation: &impl ReputationLookup,
    ) -> Vec<Change> {
        self.selector.apply(suggestions, strategy, reputation)
    }

    pub fn recommend(
        &self,
        pending: &[Suggestion],
        conflicts: &[ConflictDescriptor],
        reputation: &impl ReputationLookup,
    ) -> Vec<Recommendation> {
        self.recommender.recommend(pending, conflicts, reputation)
    }
}
