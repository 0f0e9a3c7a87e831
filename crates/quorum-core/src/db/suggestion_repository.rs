//! Suggestion repository

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{IdeaId, Suggestion, SuggestionId, SuggestionKind, SuggestionState};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use serde::{Deserialize, Serialize};

use super::{parse_column, parse_optional_column};

const SELECT_COLUMNS: &str = "SELECT id, idea_id, author_id, parent_id, content, kind, state,
        accepted_by, accepted_at, rejected_at, merged_into, created_at
    FROM suggestions";

/// Per-idea suggestion counters
///
/// `accepted` includes suggestions accepted through a merge; `merged` counts
/// only those.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub merged: usize,
    pub rejected: usize,
    pub by_kind: BTreeMap<String, usize>,
}

/// State selector for listings. `Merged` narrows `Accepted` to merge-consumed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Pending,
    Accepted,
    Merged,
    Rejected,
}

impl StateFilter {
    const fn clause(self) -> &'static str {
        match self {
            Self::Pending => " AND state = 'pending'",
            Self::Accepted => " AND state = 'accepted'",
            Self::Merged => " AND merged_into IS NOT NULL",
            Self::Rejected => " AND state = 'rejected'",
        }
    }
}

impl FromStr for StateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "merged" => Ok(Self::Merged),
            "rejected" => Ok(Self::Rejected),
            _ => Err(Error::InvalidInput(format!("unknown suggestion state '{s}'"))),
        }
    }
}

/// Optional narrowing of [`SuggestionRepository::list_for_idea`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionFilter {
    pub kind: Option<SuggestionKind>,
    pub state: Option<StateFilter>,
}

impl SuggestionFilter {
    #[must_use]
    pub const fn with_kind(mut self, kind: SuggestionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn with_state(mut self, state: StateFilter) -> Self {
        self.state = Some(state);
        self
    }
}

/// A root suggestion and every reply below it, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionThread {
    pub root: Suggestion,
    pub replies: Vec<Suggestion>,
}

/// Trait for suggestion storage operations
pub trait SuggestionRepository {
    /// Persist a new suggestion
    fn insert(&self, suggestion: &Suggestion) -> Result<()>;

    /// Get a suggestion by ID
    fn get(&self, id: &SuggestionId) -> Result<Option<Suggestion>>;

    /// Suggestions of an idea matching `filter`, oldest first
    fn list_for_idea(&self, idea_id: &IdeaId, filter: &SuggestionFilter)
        -> Result<Vec<Suggestion>>;

    /// Pending suggestions of an idea, oldest first
    fn list_pending(&self, idea_id: &IdeaId) -> Result<Vec<Suggestion>>;

    /// The whole reply thread containing `id`, starting from its root.
    ///
    /// Returns `None` when `id` is unknown.
    fn thread(&self, id: &SuggestionId) -> Result<Option<SuggestionThread>>;

    /// Resolve `ids` to pending suggestions of `idea_id`.
    ///
    /// Unknown, foreign and non-pending IDs are dropped. Caller order is kept
    /// and duplicates are collapsed to their first occurrence.
    fn find_pending(&self, idea_id: &IdeaId, ids: &[SuggestionId]) -> Result<Vec<Suggestion>>;

    /// Write a state change made on a pending suggestion.
    ///
    /// Fails with [`Error::StaleSuggestion`] when the stored row already left
    /// `pending`.
    fn update_state(&self, suggestion: &Suggestion) -> Result<()>;

    /// Counters for an idea
    fn stats(&self, idea_id: &IdeaId) -> Result<SuggestionStats>;
}

/// `SQLite` implementation of `SuggestionRepository`
pub struct SqliteSuggestionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSuggestionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_suggestion(row: &Row<'_>) -> rusqlite::Result<Suggestion> {
        let state_name: String = row.get(6)?;
        let state = match state_name.as_str() {
            "pending" => SuggestionState::Pending,
            "accepted" => SuggestionState::Accepted {
                accepted_by: required(row, 7, parse_optional_column(row, 7)?)?,
                accepted_at: required(row, 8, row.get(8)?)?,
                merged_into: parse_optional_column(row, 10)?,
            },
            "rejected" => SuggestionState::Rejected {
                rejected_at: required(row, 9, row.get(9)?)?,
            },
            other => {
                return Err(conversion_error(
                    6,
                    Error::InvalidInput(format!("unknown suggestion state '{other}'")),
                ))
            }
        };

        Ok(Suggestion {
            id: parse_column(row, 0)?,
            idea_id: parse_column(row, 1)?,
            author_id: parse_column(row, 2)?,
            parent_id: parse_optional_column(row, 3)?,
            content: row.get(4)?,
            kind: parse_column(row, 5)?,
            state,
            created_at: row.get(11)?,
        })
    }

    fn query_list(&self, sql: &str, params: impl Params) -> Result<Vec<Suggestion>> {
        let mut stmt = self.conn.prepare(sql)?;
        let suggestions = stmt
            .query_map(params, Self::parse_suggestion)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(suggestions)
    }
}

fn conversion_error(idx: usize, error: Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Null, Box::new(error))
}

/// Unwrap a column the row's state requires to be set
fn required<T>(row: &Row<'_>, idx: usize, value: Option<T>) -> rusqlite::Result<T> {
    value.ok_or_else(|| {
        let column = row.as_ref().column_name(idx).unwrap_or("?").to_string();
        conversion_error(idx, Error::Database(format!("column {column} is NULL")))
    })
}

impl SuggestionRepository for SqliteSuggestionRepository<'_> {
    fn insert(&self, suggestion: &Suggestion) -> Result<()> {
        let (accepted_by, accepted_at, merged_into, rejected_at) = state_columns(&suggestion.state);
        self.conn.execute(
            "INSERT INTO suggestions (id, idea_id, author_id, parent_id, content, kind, state,
                accepted_by, accepted_at, rejected_at, merged_into, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                suggestion.id.as_str(),
                suggestion.idea_id.as_str(),
                suggestion.author_id.as_str(),
                suggestion.parent_id.map(|id| id.as_str()),
                suggestion.content,
                suggestion.kind.as_str(),
                suggestion.state.name(),
                accepted_by,
                accepted_at,
                rejected_at,
                merged_into,
                suggestion.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &SuggestionId) -> Result<Option<Suggestion>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
        Ok(self
            .conn
            .query_row(&sql, params![id.as_str()], Self::parse_suggestion)
            .optional()?)
    }

    fn list_for_idea(
        &self,
        idea_id: &IdeaId,
        filter: &SuggestionFilter,
    ) -> Result<Vec<Suggestion>> {
        let state_clause = filter.state.map_or("", StateFilter::clause);
        let sql = format!(
            "{SELECT_COLUMNS} WHERE idea_id = ?1 AND (?2 IS NULL OR kind = ?2){state_clause}
             ORDER BY created_at ASC, id ASC"
        );
        self.query_list(
            &sql,
            params![idea_id.as_str(), filter.kind.map(SuggestionKind::as_str)],
        )
    }

    fn list_pending(&self, idea_id: &IdeaId) -> Result<Vec<Suggestion>> {
        self.list_for_idea(
            idea_id,
            &SuggestionFilter::default().with_state(StateFilter::Pending),
        )
    }

    fn thread(&self, id: &SuggestionId) -> Result<Option<SuggestionThread>> {
        let root_id: Option<String> = self
            .conn
            .query_row(
                "WITH RECURSIVE ancestors(id, parent_id) AS (
                     SELECT id, parent_id FROM suggestions WHERE id = ?1
                     UNION ALL
                     SELECT s.id, s.parent_id FROM suggestions s
                     JOIN ancestors a ON s.id = a.parent_id
                 )
                 SELECT id FROM ancestors WHERE parent_id IS NULL",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(root_id) = root_id else {
            return Ok(None);
        };

        let sql = format!(
            "WITH RECURSIVE descendants(id) AS (
                 SELECT ?1
                 UNION ALL
                 SELECT s.id FROM suggestions s JOIN descendants d ON s.parent_id = d.id
             )
             {SELECT_COLUMNS} WHERE id IN (SELECT id FROM descendants)
             ORDER BY id = ?1 DESC, created_at ASC, id ASC"
        );
        let mut members = self.query_list(&sql, params![root_id])?.into_iter();
        Ok(members.next().map(|root| SuggestionThread {
            root,
            replies: members.collect(),
        }))
    }

    fn find_pending(&self, idea_id: &IdeaId, ids: &[SuggestionId]) -> Result<Vec<Suggestion>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            match self.get(id)? {
                Some(suggestion) if suggestion.idea_id == *idea_id && suggestion.is_pending() => {
                    found.push(suggestion);
                }
                Some(_) | None => {
                    tracing::debug!(suggestion = %id, "Skipping suggestion not pending on idea");
                }
            }
        }
        Ok(found)
    }

    fn update_state(&self, suggestion: &Suggestion) -> Result<()> {
        let (accepted_by, accepted_at, merged_into, rejected_at) = state_columns(&suggestion.state);
        let rows = self.conn.execute(
            "UPDATE suggestions
             SET state = ?, accepted_by = ?, accepted_at = ?, rejected_at = ?, merged_into = ?
             WHERE id = ? AND state = 'pending'",
            params![
                suggestion.state.name(),
                accepted_by,
                accepted_at,
                rejected_at,
                merged_into,
                suggestion.id.as_str(),
            ],
        )?;

        if rows == 0 {
            return match self.get(&suggestion.id)? {
                Some(_) => Err(Error::StaleSuggestion(suggestion.id)),
                None => Err(Error::NotFound(format!("Suggestion {}", suggestion.id))),
            };
        }
        Ok(())
    }

    fn stats(&self, idea_id: &IdeaId) -> Result<SuggestionStats> {
        let mut stmt = self.conn.prepare(
            "SELECT state, merged_into IS NOT NULL, kind, COUNT(*)
             FROM suggestions WHERE idea_id = ?
             GROUP BY state, merged_into IS NOT NULL, kind",
        )?;
        let rows = stmt.query_map(params![idea_id.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut stats = SuggestionStats::default();
        for row in rows {
            let (state, merged, kind, count) = row?;
            let count = usize::try_from(count).unwrap_or_default();
            stats.total += count;
            *stats.by_kind.entry(kind).or_default() += count;
            match state.as_str() {
                "pending" => stats.pending += count,
                "accepted" => {
                    stats.accepted += count;
                    if merged {
                        stats.merged += count;
                    }
                }
                "rejected" => stats.rejected += count,
                _ => {}
            }
        }
        Ok(stats)
    }
}

/// `(accepted_by, accepted_at, merged_into, rejected_at)` for a state
fn state_columns(
    state: &SuggestionState,
) -> (Option<String>, Option<i64>, Option<String>, Option<i64>) {
    match state {
        SuggestionState::Pending => (None, None, None, None),
        SuggestionState::Accepted {
            accepted_by,
            accepted_at,
            merged_into,
        } => (
            Some(accepted_by.as_str()),
            Some(*accepted_at),
            merged_into.map(|id| id.as_str()),
            None,
        ),
        SuggestionState::Rejected { rejected_at } => (None, None, None, Some(*rejected_at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        Database, IdeaRepository, MergeRepository, SqliteIdeaRepository, SqliteMergeRepository,
    };
    use crate::models::{merge_summary, Idea, MergeId, MergeType, SuggestionMerge, UserId};
    use pretty_assertions::assert_eq;

    fn setup() -> (Database, Idea) {
        let db = Database::open_in_memory().unwrap();
        let idea = SqliteIdeaRepository::new(db.connection())
            .create(&UserId::new(), "Roadmap")
            .unwrap();
        (db, idea)
    }

    fn add(repo: &SqliteSuggestionRepository<'_>, idea: &Idea, content: &str, at: i64) -> Suggestion {
        let mut suggestion =
            Suggestion::new(idea.id, UserId::new(), content, SuggestionKind::Improvement);
        suggestion.created_at = at;
        repo.insert(&suggestion).unwrap();
        suggestion
    }

    #[test]
    fn test_insert_and_get() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let parent = add(&repo, &idea, "Add export", 1);
        let reply = Suggestion::new(idea.id, UserId::new(), "As CSV", SuggestionKind::Question)
            .with_parent(parent.id);
        repo.insert(&reply).unwrap();

        assert_eq!(repo.get(&parent.id).unwrap().unwrap(), parent);
        let fetched = repo.get(&reply.id).unwrap().unwrap();
        assert_eq!(fetched.parent_id, Some(parent.id));
        assert!(repo.get(&SuggestionId::new()).unwrap().is_none());
    }

    #[test]
    fn test_find_pending_filters_and_keeps_order() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let first = add(&repo, &idea, "one", 1);
        let second = add(&repo, &idea, "two", 2);
        let mut rejected = add(&repo, &idea, "three", 3);
        rejected.reject(4).unwrap();
        repo.update_state(&rejected).unwrap();

        let other_idea = SqliteIdeaRepository::new(db.connection())
            .create(&UserId::new(), "Other")
            .unwrap();
        let foreign = add(&repo, &other_idea, "foreign", 5);

        let found = repo
            .find_pending(
                &idea.id,
                &[
                    second.id,
                    rejected.id,
                    foreign.id,
                    SuggestionId::new(),
                    first.id,
                    second.id,
                ],
            )
            .unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_update_state_is_guarded() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let stored = add(&repo, &idea, "Add search", 1);

        let mut accepted = stored.clone();
        accepted.accept(UserId::new(), 10).unwrap();
        repo.update_state(&accepted).unwrap();

        let mut rejected = stored;
        rejected.reject(11).unwrap();
        let err = repo.update_state(&rejected).unwrap_err();
        assert!(matches!(err, Error::StaleSuggestion(id) if id == rejected.id));

        let fetched = repo.get(&accepted.id).unwrap().unwrap();
        assert_eq!(fetched.state, accepted.state);
    }

    #[test]
    fn test_update_state_unknown_is_not_found() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let mut ghost = Suggestion::new(idea.id, UserId::new(), "ghost", SuggestionKind::General);
        ghost.reject(1).unwrap();
        assert!(matches!(repo.update_state(&ghost), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_pending_and_stats() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let a = add(&repo, &idea, "a", 3);
        let b = add(&repo, &idea, "b", 1);
        let mut c = add(&repo, &idea, "c", 2);
        c.reject(4).unwrap();
        repo.update_state(&c).unwrap();

        let pending: Vec<_> = repo
            .list_pending(&idea.id)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(pending, vec![b.id, a.id]);
        assert_eq!(
            repo.list_for_idea(&idea.id, &SuggestionFilter::default())
                .unwrap()
                .len(),
            3
        );

        let stats = repo.stats(&idea.id).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.accepted, 0);
        assert_eq!(stats.by_kind.get("improvement"), Some(&3));
    }

    #[test]
    fn test_list_for_idea_filters_kind_and_state() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let improvement = add(&repo, &idea, "Add tags", 1);
        let mut question =
            Suggestion::new(idea.id, UserId::new(), "Why tags?", SuggestionKind::Question);
        question.created_at = 2;
        repo.insert(&question).unwrap();
        let mut merged = add(&repo, &idea, "Add colors", 3);
        let record = SuggestionMerge {
            id: MergeId::new(),
            idea_id: idea.id,
            merged_by: idea.author_id,
            merged_suggestions: vec![merged.id],
            merge_summary: merge_summary(1, 0),
            changes_applied: Vec::new(),
            merge_type: MergeType::Manual,
            has_conflicts: false,
            conflict_resolution: None,
            created_at: 4,
        };
        SqliteMergeRepository::new(db.connection())
            .insert(&record)
            .unwrap();
        merged.mark_merged(idea.author_id, record.id, 4).unwrap();
        repo.update_state(&merged).unwrap();

        let ids = |filter: SuggestionFilter| -> Vec<SuggestionId> {
            repo.list_for_idea(&idea.id, &filter)
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect()
        };

        let improvements = SuggestionFilter::default().with_kind(SuggestionKind::Improvement);
        assert_eq!(ids(improvements), vec![improvement.id, merged.id]);
        assert_eq!(
            ids(improvements.with_state(StateFilter::Pending)),
            vec![improvement.id]
        );
        assert_eq!(
            ids(SuggestionFilter::default().with_state(StateFilter::Merged)),
            vec![merged.id]
        );
        assert_eq!(
            ids(SuggestionFilter::default().with_state(StateFilter::Accepted)),
            vec![merged.id]
        );
        assert!(ids(SuggestionFilter::default().with_state(StateFilter::Rejected)).is_empty());
    }

    #[test]
    fn test_state_filter_parsing() {
        assert_eq!(" Merged ".parse::<StateFilter>().unwrap(), StateFilter::Merged);
        assert!(matches!(
            "open".parse::<StateFilter>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_thread_walks_up_to_root_and_collects_replies() {
        let (db, idea) = setup();
        let repo = SqliteSuggestionRepository::new(db.connection());
        let root = add(&repo, &idea, "Add export", 1);
        let reply = |parent: &Suggestion, content: &str, at: i64| {
            let mut child =
                Suggestion::new(idea.id, UserId::new(), content, SuggestionKind::Question)
                    .with_parent(parent.id);
            child.created_at = at;
            repo.insert(&child).unwrap();
            child
        };
        let late = reply(&root, "As PDF too?", 5);
        let early = reply(&root, "As CSV?", 2);
        let nested = reply(&early, "With headers", 3);
        let unrelated = add(&repo, &idea, "Dark mode", 4);

        let thread = repo.thread(&nested.id).unwrap().unwrap();
        assert_eq!(thread.root, root);
        let reply_ids: Vec<_> = thread.replies.iter().map(|s| s.id).collect();
        assert_eq!(reply_ids, vec![early.id, nested.id, late.id]);

        let solo = repo.thread(&unrelated.id).unwrap().unwrap();
        assert_eq!(solo.root.id, unrelated.id);
        assert!(solo.replies.is_empty());

        assert!(repo.thread(&SuggestionId::new()).unwrap().is_none());
    }
}
