//! Merge orchestrator shared by every client.
//!
//! `MergeService` owns the database behind a mutex, the configured engine and
//! the notifier. Each merge runs in a single immediate transaction: conflict
//! rows, the merge record, the points award and the consumed-suggestion
//! updates either all land or none do.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::notifier::{MergeNotifier, TracingNotifier};
use crate::config::MergeConfig;
use crate::db::{
    ConflictRepository, Database, IdeaAccess, IdeaRepository, MergeRepository, PointsAwarder,
    PointsRepository, SqliteConflictRepository, SqliteIdeaRepository, SqliteMergeRepository,
    SqlitePointsRepository, SqliteSuggestionRepository, SuggestionFilter, SuggestionRepository,
    SuggestionStats, SuggestionThread,
};
use crate::engine::{MergeEngine, Recommendation};
use crate::error::{Error, Result};
use crate::models::{
    merge_summary, ConflictDescriptor, ConflictId, Idea, IdeaId, MergeId, MergeOptions,
    MergeType, PointsEntry, PointsEvent, ResolutionStatus, Suggestion, SuggestionConflict,
    SuggestionId, SuggestionKind, SuggestionMerge, UserId,
};

/// Result of a read-only conflict analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    pub conflicts: Vec<ConflictDescriptor>,
    pub suggestions_count: usize,
    pub can_merge: bool,
}

/// Thread-safe merge orchestrator.
#[derive(Clone)]
pub struct MergeService {
    db: Arc<Mutex<Database>>,
    engine: MergeEngine,
    config: MergeConfig,
    notifier: Arc<dyn MergeNotifier>,
}

impl MergeService {
    /// Open a service over the database file at `path`.
    pub fn open(path: impl AsRef<Path>, config: MergeConfig) -> Result<Self> {
        Ok(Self::new(Database::open(path)?, config))
    }

    /// Open a service over an in-memory database (primarily for tests).
    pub fn open_in_memory(config: MergeConfig) -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?, config))
    }

    fn new(db: Database, config: MergeConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            engine: MergeEngine::from_config(&config),
            config,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the default [`TracingNotifier`].
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn MergeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::Database("database lock poisoned".to_string()))
    }

    // Ideas

    pub fn create_idea(&self, author: &UserId, title: &str) -> Result<Idea> {
        let db = self.lock()?;
        let idea = SqliteIdeaRepository::new(db.connection()).create(author, title)?;
        tracing::info!(idea = %idea.id, "Created idea");
        Ok(idea)
    }

    pub fn get_idea(&self, id: &IdeaId) -> Result<Option<Idea>> {
        let db = self.lock()?;
        SqliteIdeaRepository::new(db.connection()).get(id)
    }

    /// Whether `actor` may merge, resolve, accept or reject on `idea`.
    pub fn can_act(&self, actor: &UserId, idea: &IdeaId) -> Result<bool> {
        let db = self.lock()?;
        SqliteIdeaRepository::new(db.connection()).can_act(actor, idea)
    }

    // Suggestions

    /// Record a new pending suggestion and credit its author.
    pub fn create_suggestion(
        &self,
        idea_id: &IdeaId,
        author: &UserId,
        content: &str,
        kind: SuggestionKind,
        parent: Option<SuggestionId>,
    ) -> Result<Suggestion> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput(
                "suggestion content cannot be empty".to_string(),
            ));
        }

        let mut db = self.lock()?;
        let tx = db.transaction()?;
        if SqliteIdeaRepository::new(&tx).get(idea_id)?.is_none() {
            return Err(Error::NotFound(format!("Idea {idea_id}")));
        }

        let suggestions = SqliteSuggestionRepository::new(&tx);
        let mut suggestion = Suggestion::new(*idea_id, *author, content, kind);
        if let Some(parent_id) = parent {
            match suggestions.get(&parent_id)? {
                Some(parent) if parent.idea_id == *idea_id => {
                    suggestion = suggestion.with_parent(parent_id);
                }
                Some(_) => {
                    return Err(Error::InvalidInput(format!(
                        "parent suggestion {parent_id} belongs to another idea"
                    )));
                }
                None => return Err(Error::NotFound(format!("Suggestion {parent_id}"))),
            }
        }

        suggestions.insert(&suggestion)?;
        SqlitePointsRepository::new(&tx, &self.config.points)
            .award(author, PointsEvent::SuggestionCreated)?;
        tx.commit()?;

        tracing::debug!(suggestion = %suggestion.id, idea = %idea_id, "Created suggestion");
        Ok(suggestion)
    }

    pub fn get_suggestion(&self, id: &SuggestionId) -> Result<Option<Suggestion>> {
        let db = self.lock()?;
        SqliteSuggestionRepository::new(db.connection()).get(id)
    }

    pub fn list_suggestions(
        &self,
        idea_id: &IdeaId,
        filter: &SuggestionFilter,
    ) -> Result<Vec<Suggestion>> {
        let db = self.lock()?;
        SqliteSuggestionRepository::new(db.connection()).list_for_idea(idea_id, filter)
    }

    /// The reply thread `id` belongs to, rooted at its top-level suggestion.
    pub fn suggestion_thread(&self, id: &SuggestionId) -> Result<SuggestionThread> {
        let db = self.lock()?;
        SqliteSuggestionRepository::new(db.connection())
            .thread(id)?
            .ok_or_else(|| Error::NotFound(format!("Suggestion {id}")))
    }

    pub fn list_pending(&self, idea_id: &IdeaId) -> Result<Vec<Suggestion>> {
        let db = self.lock()?;
        SqliteSuggestionRepository::new(db.connection()).list_pending(idea_id)
    }

    /// Accept a pending suggestion outside of a merge.
    ///
    /// The suggestion's author is credited with `suggestion_accepted`.
    pub fn accept_suggestion(&self, id: &SuggestionId, actor: &UserId) -> Result<Suggestion> {
        let mut db = self.lock()?;
        let tx = db.transaction()?;
        let repo = SqliteSuggestionRepository::new(&tx);
        let mut suggestion = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("Suggestion {id}")))?;

        suggestion.accept(*actor, now_ms())?;
        repo.update_state(&suggestion)?;
        SqlitePointsRepository::new(&tx, &self.config.points)
            .award(&suggestion.author_id, PointsEvent::SuggestionAccepted)?;
        tx.commit()?;

        tracing::info!(suggestion = %id, accepted_by = %actor, "Accepted suggestion");
        Ok(suggestion)
    }

    pub fn reject_suggestion(&self, id: &SuggestionId) -> Result<Suggestion> {
        let db = self.lock()?;
        let repo = SqliteSuggestionRepository::new(db.connection());
        let mut suggestion = repo
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("Suggestion {id}")))?;

        suggestion.reject(now_ms())?;
        repo.update_state(&suggestion)?;

        tracing::info!(suggestion = %id, "Rejected suggestion");
        Ok(suggestion)
    }

    pub fn suggestion_stats(&self, idea_id: &IdeaId) -> Result<SuggestionStats> {
        let db = self.lock()?;
        SqliteSuggestionRepository::new(db.connection()).stats(idea_id)
    }

    // Analysis and merging

    /// Detect conflicts among the pending suggestions named by `ids`.
    ///
    /// Nothing is written.
    pub fn analyze(&self, idea_id: &IdeaId, ids: &[SuggestionId]) -> Result<ConflictAnalysis> {
        let suggestions = {
            let db = self.lock()?;
            SqliteSuggestionRepository::new(db.connection()).find_pending(idea_id, ids)?
        };

        if suggestions.is_empty() {
            return Ok(ConflictAnalysis {
                conflicts: Vec::new(),
                suggestions_count: 0,
                can_merge: false,
            });
        }

        let conflicts = self.engine.detect(&suggestions);
        Ok(ConflictAnalysis {
            can_merge: conflicts.is_empty(),
            suggestions_count: suggestions.len(),
            conflicts,
        })
    }

    /// Merge the pending suggestions named by `ids` into one merge record.
    ///
    /// IDs that are unknown, belong to another idea or are no longer pending
    /// are skipped. With nothing left to merge this returns
    /// [`Error::NoValidSuggestions`] without writing anything.
    pub fn merge(
        &self,
        idea_id: &IdeaId,
        ids: &[SuggestionId],
        actor: &UserId,
        options: &MergeOptions,
    ) -> Result<SuggestionMerge> {
        let merge = {
            let mut db = self.lock().map_err(Error::merge_failed)?;
            let tx = db.transaction().map_err(Error::merge_failed)?;
            let suggestions = SqliteSuggestionRepository::new(&tx)
                .find_pending(idea_id, ids)
                .map_err(Error::merge_failed)?;
            if suggestions.is_empty() {
                return Err(Error::NoValidSuggestions);
            }

            let outcome = self
                .merge_within(&tx, idea_id, &suggestions, actor, options)
                .and_then(|merge| {
                    tx.commit()?;
                    Ok(merge)
                });
            match outcome {
                Ok(merge) => merge,
                Err(error) => {
                    tracing::warn!(idea = %idea_id, "Merge rolled back: {error}");
                    return Err(Error::merge_failed(error));
                }
            }
        };

        tracing::info!(merge = %merge.id, strategy = %options.strategy, "Merge committed");
        self.notifier.merge_completed(&merge);
        Ok(merge)
    }

    fn merge_within(
        &self,
        conn: &Connection,
        idea_id: &IdeaId,
        suggestions: &[Suggestion],
        actor: &UserId,
        options: &MergeOptions,
    ) -> Result<SuggestionMerge> {
        let descriptors = self.engine.detect(suggestions);
        let conflicts = SqliteConflictRepository::new(conn);
        for descriptor in &descriptors {
            if let Some(conflict) = SuggestionConflict::from_descriptor(*idea_id, descriptor) {
                conflicts.insert(&conflict)?;
            }
        }

        let points = SqlitePointsRepository::new(conn, &self.config.points);
        let authors: Vec<UserId> = suggestions.iter().map(|s| s.author_id).collect();
        let reputation = points.reputation_snapshot(&authors)?;
        let changes = self.engine.apply(suggestions, options.strategy, &reputation);

        let merge = SuggestionMerge {
            id: MergeId::new(),
            idea_id: *idea_id,
            merged_by: *actor,
            merged_suggestions: suggestions.iter().map(|s| s.id).collect(),
            merge_summary: merge_summary(suggestions.len(), changes.len()),
            changes_applied: changes,
            merge_type: MergeType::from_auto_merge(options.auto_merge),
            has_conflicts: !descriptors.is_empty(),
            conflict_resolution: options.conflict_resolution.clone(),
            created_at: now_ms(),
        };
        SqliteMergeRepository::new(conn).insert(&merge)?;
        points.award(actor, PointsEvent::MergePerformed)?;

        let repo = SqliteSuggestionRepository::new(conn);
        for suggestion in suggestions {
            let mut consumed = suggestion.clone();
            consumed.mark_merged(*actor, merge.id, merge.created_at)?;
            repo.update_state(&consumed)?;
        }

        Ok(merge)
    }

    /// Merge records of an idea, newest first
    pub fn merge_history(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionMerge>> {
        let db = self.lock()?;
        SqliteMergeRepository::new(db.connection()).list_for_idea(idea_id)
    }

    // Conflict ledger

    /// Unresolved conflicts of an idea, oldest first
    pub fn unresolved_conflicts(&self, idea_id: &IdeaId) -> Result<Vec<SuggestionConflict>> {
        let db = self.lock()?;
        SqliteConflictRepository::new(db.connection()).list_unresolved(idea_id)
    }

    pub fn get_conflict(&self, id: &ConflictId) -> Result<Option<SuggestionConflict>> {
        let db = self.lock()?;
        SqliteConflictRepository::new(db.connection()).get(id)
    }

    pub fn resolve_conflict(
        &self,
        id: &ConflictId,
        actor: &UserId,
        notes: Option<&str>,
    ) -> Result<SuggestionConflict> {
        self.close_conflict(id, ResolutionStatus::Resolved, actor, notes)
    }

    pub fn ignore_conflict(
        &self,
        id: &ConflictId,
        actor: &UserId,
        notes: Option<&str>,
    ) -> Result<SuggestionConflict> {
        self.close_conflict(id, ResolutionStatus::Ignored, actor, notes)
    }

    fn close_conflict(
        &self,
        id: &ConflictId,
        status: ResolutionStatus,
        actor: &UserId,
        notes: Option<&str>,
    ) -> Result<SuggestionConflict> {
        let conflict = {
            let db = self.lock()?;
            let repo = SqliteConflictRepository::new(db.connection());
            let mut conflict = repo
                .get(id)
                .map_err(Error::resolve_failed)?
                .ok_or_else(|| Error::NotFound(format!("Conflict {id}")))?;

            conflict.close(status, *actor, normalize_notes(notes), now_ms())?;
            repo.close(&conflict).map_err(Error::resolve_failed)?;
            conflict
        };

        self.notifier.conflict_closed(&conflict);
        Ok(conflict)
    }

    // Recommendations and points

    /// Suggested next merges for the pending suggestions of an idea
    pub fn recommendations(&self, idea_id: &IdeaId) -> Result<Vec<Recommendation>> {
        let (pending, reputation) = {
            let db = self.lock()?;
            let pending =
                SqliteSuggestionRepository::new(db.connection()).list_pending(idea_id)?;
            let authors: Vec<UserId> = pending.iter().map(|s| s.author_id).collect();
            let reputation = SqlitePointsRepository::new(db.connection(), &self.config.points)
                .reputation_snapshot(&authors)?;
            (pending, reputation)
        };

        let conflicts = self.engine.detect(&pending);
        Ok(self.engine.recommend(&pending, &conflicts, &reputation))
    }

    pub fn points_total(&self, user: &UserId) -> Result<i64> {
        let db = self.lock()?;
        SqlitePointsRepository::new(db.connection(), &self.config.points).total_for(user)
    }

    pub fn points_history(&self, user: &UserId, limit: usize) -> Result<Vec<PointsEntry>> {
        let db = self.lock()?;
        SqlitePointsRepository::new(db.connection(), &self.config.points)
            .list_for_user(user, limit)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string)
}
