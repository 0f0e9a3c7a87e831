//! Error types for quorum-core

use thiserror::Error;

use crate::models::{ConflictId, SuggestionId};

/// Result type alias using quorum-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quorum-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// None of the requested suggestions is pending on the idea
    #[error("No valid suggestions to merge")]
    NoValidSuggestions,

    /// The merge transaction was rolled back
    #[error("Failed to merge suggestions")]
    MergeFailed(#[source] Box<Error>),

    /// Persisting a conflict resolution failed
    #[error("Failed to resolve conflict")]
    ResolveFailed(#[source] Box<Error>),

    /// The conflict has already left the unresolved state
    #[error("Conflict {0} is already closed")]
    AlreadyResolved(ConflictId),

    /// A suggestion state change that the lifecycle does not allow
    #[error("Suggestion {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: SuggestionId,
        from: &'static str,
        to: &'static str,
    },

    /// A guarded update found the suggestion already out of `pending`
    #[error("Suggestion {0} is no longer pending")]
    StaleSuggestion(SuggestionId),
}

impl Error {
    /// Wrap a persistence failure raised inside the merge transaction.
    pub(crate) fn merge_failed(cause: Self) -> Self {
        match cause {
            already @ Self::MergeFailed(_) => already,
            other => Self::MergeFailed(Box::new(other)),
        }
    }

    /// Wrap a persistence failure raised while closing a conflict.
    ///
    /// State errors pass through untouched so callers can tell them apart.
    pub(crate) fn resolve_failed(cause: Self) -> Self {
        match cause {
            passthrough @ (Self::AlreadyResolved(_) | Self::NotFound(_) | Self::ResolveFailed(_)) => {
                passthrough
            }
            other => Self::ResolveFailed(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn merge_failed_keeps_cause_as_source() {
        let error = Error::merge_failed(Error::Database("disk full".into()));
        assert_eq!(error.to_string(), "Failed to merge suggestions");
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "Database error: disk full");
    }

    #[test]
    fn merge_failed_is_not_nested_twice() {
        let error = Error::merge_failed(Error::merge_failed(Error::Database("x".into())));
        let Error::MergeFailed(inner) = error else {
            panic!("expected MergeFailed");
        };
        assert!(matches!(*inner, Error::Database(_)));
    }

    #[test]
    fn resolve_failed_passes_state_errors_through() {
        let id = ConflictId::new();
        let error = Error::resolve_failed(Error::AlreadyResolved(id));
        assert!(matches!(error, Error::AlreadyResolved(found) if found == id));

        let wrapped = Error::resolve_failed(Error::Database("locked".into()));
        assert!(matches!(wrapped, Error::ResolveFailed(_)));
    }
}
