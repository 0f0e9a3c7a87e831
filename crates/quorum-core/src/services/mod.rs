//! Services shared by Quorum clients.

mod merge_service;
mod notifier;

pub use merge_service::{ConflictAnalysis, MergeService};
pub use notifier::{MergeNotifier, TracingNotifier};
