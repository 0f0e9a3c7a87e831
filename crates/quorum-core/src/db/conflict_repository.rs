//! Conflict ledger repository

use crate::error::{Error, Result};
use crate::models::{ConflictId, IdeaId, SuggestionConflict};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{json_column, parse_column, parse_optional_column};

const SELECT_COLUMNS: &str = "SELECT id, idea_id, suggestion_1_id, suggestion_2_id, conflict_type,
        field_name, description, conflicting_values, resolution_status, resolved_by,
        resolution_notes, resolved_at, created_at
    FROM suggestion_conflicts";

/// Trait for conflict ledger operations
pub trait ConflictRepository {
    fn insert(&self, conflict: &SuggestionConflict) -> Result<()>;

    fn get(&self, id: &ConflictId) -> Result<Option<SuggestionConflict>>;

    /// Unresolved conflicts of an idea, oldest first
    fn list_unresolved(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionConflict>>;

    /// Persist the closing of a conflict.
    ///
    /// Only applies to rows still `unresolved`; a row closed in the meantime
    /// yields [`Error::AlreadyResolved`].
    fn close(&self, conflict: &SuggestionConflict) -> Result<()>;
}

/// `SQLite` implementation of `ConflictRepository`
pub struct SqliteConflictRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteConflictRepository<'a> {
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_conflict(row: &Row<'_>) -> rusqlite::Result<SuggestionConflict> {
        Ok(SuggestionConflict {
            id: parse_column(row, 0)?,
            idea_id: parse_column(row, 1)?,
            suggestion_1_id: parse_column(row, 2)?,
            suggestion_2_id: parse_column(row, 3)?,
            conflict_type: parse_column(row, 4)?,
            field_name: row.get(5)?,
            description: row.get(6)?,
            conflicting_values: json_column(row, 7)?,
            resolution_status: parse_column(row, 8)?,
            resolved_by: parse_optional_column(row, 9)?,
            resolution_notes: row.get(10)?,
            resolved_at: row.get(11)?,
            created_at: row.get(12)?,
        })
    }
}

impl ConflictRepository for SqliteConflictRepository<'_> {
    fn insert(&self, conflict: &SuggestionConflict) -> Result<()> {
        self.conn.execute(
            "INSERT INTO suggestion_conflicts (id, idea_id, suggestion_1_id, suggestion_2_id,
                conflict_type, field_name, description, conflicting_values, resolution_status,
                resolved_by, resolution_notes, resolved_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                conflict.id.as_str(),
                conflict.idea_id.as_str(),
                conflict.suggestion_1_id.as_str(),
                conflict.suggestion_2_id.as_str(),
                conflict.conflict_type.as_str(),
                conflict.field_name,
                conflict.description,
                serde_json::to_string(&conflict.conflicting_values)?,
                conflict.resolution_status.as_str(),
                conflict.resolved_by.map(|id| id.as_str()),
                conflict.resolution_notes,
                conflict.resolved_at,
                conflict.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &ConflictId) -> Result<Option<SuggestionConflict>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![id.as_str()], Self::parse_conflict)
            .optional()?)
    }

    fn list_unresolved(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionConflict>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE idea_id = ? AND resolution_status = 'unresolved'
             ORDER BY created_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let conflicts = stmt
            .query_map(params![idea_id.as_str()], Self::parse_conflict)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(conflicts)
    }

    fn close(&self, conflict: &SuggestionConflict) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE suggestion_conflicts
             SET resolution_status = ?, resolved_by = ?, resolution_notes = ?, resolved_at = ?
             WHERE id = ? AND resolution_status = 'unresolved'",
            params![
                conflict.resolution_status.as_str(),
                conflict.resolved_by.map(|id| id.as_str()),
                conflict.resolution_notes,
                conflict.resolved_at,
                conflict.id.as_str(),
            ],
        )?;

        if rows == 0 {
            return match self.get(&conflict.id)? {
                Some(_) => Err(Error::AlreadyResolved(conflict.id)),
                None => Err(Error::NotFound(format!("Conflict {}", conflict.id))),
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        Database, IdeaRepository, SqliteIdeaRepository, SqliteSuggestionRepository,
        SuggestionRepository,
    };
    use crate::models::{
        ConflictDescriptor, ResolutionStatus, Suggestion, SuggestionKind, UserId,
        CONTENT_OVERLAP_DESCRIPTION,
    };
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, IdeaId, SuggestionConflict) {
        let db = Database::open_in_memory().unwrap();
        let idea = SqliteIdeaRepository::new(db.connection())
            .create(&UserId::new(), "Search")
            .unwrap();
        let suggestions = SqliteSuggestionRepository::new(db.connection());
        let first = Suggestion::new(idea.id, UserId::new(), "add filters", SuggestionKind::General);
        let second = Suggestion::new(idea.id, UserId::new(), "add filters", SuggestionKind::General);
        suggestions.insert(&first).unwrap();
        suggestions.insert(&second).unwrap();

        let descriptor = ConflictDescriptor::ContentOverlap {
            first: first.id,
            second: second.id,
            similarity: 1.0,
            description: CONTENT_OVERLAP_DESCRIPTION.to_string(),
        };
        let conflict = SuggestionConflict::from_descriptor(idea.id, &descriptor).unwrap();
        (db, idea.id, conflict)
    }

    #[test]
    fn test_insert_and_list_unresolved() {
        let (db, idea_id, conflict) = setup();
        let repo = SqliteConflictRepository::new(db.connection());
        repo.insert(&conflict).unwrap();

        let listed = repo.list_unresolved(&idea_id).unwrap();
        assert_eq!(listed, vec![conflict.clone()]);
        assert_eq!(listed[0].conflicting_values["similarity"], 1.0);
    }

    #[test]
    fn test_close_once() {
        let (db, idea_id, mut conflict) = setup();
        let repo = SqliteConflictRepository::new(db.connection());
        repo.insert(&conflict).unwrap();

        let stale = conflict.clone();
        conflict
            .close(ResolutionStatus::Ignored, UserId::new(), None, 99)
            .unwrap();
        repo.close(&conflict).unwrap();
        assert!(repo.list_unresolved(&idea_id).unwrap().is_empty());

        let mut second = stale;
        second
            .close(ResolutionStatus::Resolved, UserId::new(), Some("late".into()), 100)
            .unwrap();
        let err = repo.close(&second).unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved(id) if id == conflict.id));

        let stored = repo.get(&conflict.id).unwrap().unwrap();
        assert_eq!(stored.resolution_status, ResolutionStatus::Ignored);
        assert_eq!(stored.resolved_at, Some(99));
    }
}
