//! quorum-core - Core library for Quorum
//!
//! This crate contains the models, the pure merge engine (similarity, conflict
//! detection, grouping, strategies, recommendations), the `SQLite` persistence
//! layer and the merge orchestrator used by every Quorum interface.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;

pub use config::MergeConfig;
pub use error::{Error, Result};
pub use models::{
    ConflictId, IdeaId, MergeId, MergeOptions, MergeStrategy, Suggestion, SuggestionId, UserId,
};
pub use services::{ConflictAnalysis, MergeNotifier, MergeService, TracingNotifier};
