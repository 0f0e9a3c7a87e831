//! Points ledger model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::UserId;
use crate::error::{Error, Result};

/// Events that earn a user points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsEvent {
    SuggestionCreated,
    SuggestionAccepted,
    MergePerformed,
}

impl PointsEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuggestionCreated => "suggestion_created",
            Self::SuggestionAccepted => "suggestion_accepted",
            Self::MergePerformed => "merge_performed",
        }
    }

    /// Reason text stored next to the awarded amount
    pub const fn reason(self) -> &'static str {
        match self {
            Self::SuggestionCreated => "Made a suggestion on an idea",
            Self::SuggestionAccepted => "Suggestion was accepted",
            Self::MergePerformed => "Successfully merged suggestions",
        }
    }
}

impl fmt::Display for PointsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointsEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "suggestion_created" => Ok(Self::SuggestionCreated),
            "suggestion_accepted" => Ok(Self::SuggestionAccepted),
            "merge_performed" => Ok(Self::MergePerformed),
            other => Err(Error::InvalidInput(format!("unknown points event '{other}'"))),
        }
    }
}

/// One awarded amount in the points ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: i64,
    pub user_id: UserId,
    pub event: PointsEvent,
    pub amount: i64,
    pub reason: String,
    /// Award timestamp (Unix ms)
    pub awarded_at: i64,
}
