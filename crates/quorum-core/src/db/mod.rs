//! Database layer for Quorum

mod conflict_repository;
mod connection;
mod idea_repository;
mod merge_repository;
mod migrations;
mod points_repository;
mod suggestion_repository;

pub use conflict_repository::{ConflictRepository, SqliteConflictRepository};
pub use connection::Database;
pub use idea_repository::{IdeaAccess, IdeaRepository, SqliteIdeaRepository};
pub use merge_repository::{MergeRepository, SqliteMergeRepository};
pub use points_repository::{PointsAwarder, PointsRepository, SqlitePointsRepository};
pub use suggestion_repository::{
    SqliteSuggestionRepository, StateFilter, SuggestionFilter, SuggestionRepository,
    SuggestionStats, SuggestionThread,
};

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;

/// Read a text column and parse it with `FromStr`
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}

/// Nullable variant of [`parse_column`]
fn parse_optional_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        value.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
        })
    })
    .transpose()
}

/// Read a JSON-encoded text column
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error)))
}
