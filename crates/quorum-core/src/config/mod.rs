//! Engine configuration.
//!
//! `MergeConfig` carries the thresholds and limits used by conflict detection,
//! grouping and the merge strategies, plus the point amounts awarded for
//! lifecycle events. Every field has a default, so an absent or partial config
//! file behaves like the built-in engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::PointsEvent;

pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.70;
pub const DEFAULT_GROUPING_THRESHOLD: f64 = 0.60;
pub const DEFAULT_PRIORITY_LIMIT: usize = 3;
pub const DEFAULT_LATEST_LIMIT: usize = 5;
pub const DEFAULT_HIGH_REPUTATION_POINTS: i64 = 100;

/// Tunables for the merge engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Similarity above which two suggestions are reported as overlapping
    pub overlap_threshold: f64,
    /// Similarity above which a suggestion joins an existing group
    pub grouping_threshold: f64,
    /// Changes kept by the `priority` strategy
    pub priority_limit: usize,
    /// Changes kept by the `latest` strategy
    pub latest_limit: usize,
    /// Reputation an author needs to count as high priority in recommendations
    pub high_reputation_points: i64,
    pub points: PointsConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            grouping_threshold: DEFAULT_GROUPING_THRESHOLD,
            priority_limit: DEFAULT_PRIORITY_LIMIT,
            latest_limit: DEFAULT_LATEST_LIMIT,
            high_reputation_points: DEFAULT_HIGH_REPUTATION_POINTS,
            points: PointsConfig::default(),
        }
    }
}

/// Point amounts per event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PointsConfig {
    pub suggestion_created: i64,
    pub suggestion_accepted: i64,
    pub merge_performed: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            suggestion_created: 5,
            suggestion_accepted: 20,
            merge_performed: 15,
        }
    }
}

impl PointsConfig {
    pub const fn amount_for(&self, event: PointsEvent) -> i64 {
        match event {
            PointsEvent::SuggestionCreated => self.suggestion_created,
            PointsEvent::SuggestionAccepted => self.suggestion_accepted,
            PointsEvent::MergePerformed => self.merge_performed,
        }
    }
}

impl MergeConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
            .map_err(|error| Error::Config(format!("{}: {error}", path.display())))
    }

    /// Parse and validate configuration from a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid config JSON: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("overlap_threshold", self.overlap_threshold),
            ("grouping_threshold", self.grouping_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{field} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.priority_limit == 0 || self.latest_limit == 0 {
            return Err(Error::Config(
                "strategy limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
