//! Merge record repository

use crate::error::Result;
use crate::models::{IdeaId, MergeId, SuggestionMerge};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{json_column, parse_column};

const SELECT_COLUMNS: &str = "SELECT id, idea_id, merged_by, merged_suggestions, merge_summary,
        changes_applied, merge_type, has_conflicts, conflict_resolution, created_at
    FROM suggestion_merges";

/// Trait for merge record storage
///
/// Merge records are append-only; there is no update or delete.
pub trait MergeRepository {
    fn insert(&self, merge: &SuggestionMerge) -> Result<()>;

    fn get(&self, id: &MergeId) -> Result<Option<SuggestionMerge>>;

    /// Merge history of an idea, newest first
    fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionMerge>>;
}

/// `SQLite` implementation of `MergeRepository`
pub struct SqliteMergeRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteMergeRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_merge(row: &Row<'_>) -> rusqlite::Result<SuggestionMerge> {
        let conflict_resolution: Option<String> = row.get(8)?;
        let conflict_resolution = conflict_resolution
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|error| {
                    rusqlite::Error::FromSqlConversionFailure(
                        8,
                        rusqlite::types::Type::Text,
                        Box::new(error),
                    )
                })
            })
            .transpose()?;

        Ok(SuggestionMerge {
            id: parse_column(row, 0)?,
            idea_id: parse_column(row, 1)?,
            merged_by: parse_column(row, 2)?,
            merged_suggestions: json_column(row, 3)?,
            merge_summary: row.get(4)?,
            changes_applied: json_column(row, 5)?,
            merge_type: parse_column(row, 6)?,
            has_conflicts: row.get(7)?,
            conflict_resolution,
            created_at: row.get(9)?,
        })
    }
}

impl MergeRepository for SqliteMergeRepository<'_> {
    fn insert(&self, merge: &SuggestionMerge) -> Result<()> {
        let conflict_resolution = merge
            .conflict_resolution
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO suggestion_merges (id, idea_id, merged_by, merged_suggestions,
                merge_summary, changes_applied, merge_type, has_conflicts, conflict_resolution,
                created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                merge.id.as_str(),
                merge.idea_id.as_str(),
                merge.merged_by.as_str(),
                serde_json::to_string(&merge.merged_suggestions)?,
                merge.merge_summary,
                serde_json::to_string(&merge.changes_applied)?,
                merge.merge_type.as_str(),
                merge.has_conflicts,
                conflict_resolution,
                merge.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &MergeId) -> Result<Option<SuggestionMerge>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![id.as_str()], Self::parse_merge)
            .optional()?)
    }

    fn list_for_idea(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionMerge>> {
        // UUID v7 ids sort by creation time, breaking ties within one millisecond
        let sql = format!("{SELECT_COLUMNS} WHERE idea_id = ? ORDER BY created_at DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let merges = stmt
            .query_map(params![idea_id.as_str()], Self::parse_merge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(merges)
    }
}
