//! Points ledger repository
//!
//! Reputation is the sum of a user's awarded points. The merge engine only
//! reads it through a snapshot taken per merge.

use std::collections::HashMap;

use crate::config::PointsConfig;
use crate::error::Result;
use crate::models::{PointsEntry, PointsEvent, UserId};
use rusqlite::{params, Connection, Row};

use super::parse_column;

/// Credits a user for a lifecycle event
pub trait PointsAwarder {
    fn award(&self, user: &UserId, event: PointsEvent) -> Result<()>;
}

/// Read side of the points ledger
pub trait PointsRepository {
    /// Total points of a user, 0 when they have none
    fn total_for(&self, user: &UserId) -> Result<i64>;

    /// Totals for every listed user; users without points map to 0
    fn reputation_snapshot(&self, users: &[UserId]) -> Result<HashMap<UserId, i64>>;

    /// Most recent ledger entries of a user
    fn list_for_user(&self, user: &UserId, limit: usize) -> Result<Vec<PointsEntry>>;
}

/// `SQLite` implementation of the points ledger
pub struct SqlitePointsRepository<'a> {
    conn: &'a Connection,
    amounts: &'a PointsConfig,
}

impl<'a> SqlitePointsRepository<'a> {
    pub const fn new(conn: &'a Connection, amounts: &'a PointsConfig) -> Self {
        Self { conn, amounts }
    }

    fn parse_entry(row: &Row<'_>) -> rusqlite::Result<PointsEntry> {
        Ok(PointsEntry {
            id: row.get(0)?,
            user_id: parse_column(row, 1)?,
            event: parse_column(row, 2)?,
            amount: row.get(3)?,
            reason: row.get(4)?,
            awarded_at: row.get(5)?,
        })
    }
}

impl PointsAwarder for SqlitePointsRepository<'_> {
    fn award(&self, user: &UserId, event: PointsEvent) -> Result<()> {
        let amount = self.amounts.amount_for(event);
        if amount == 0 {
            return Ok(());
        }

        self.conn.execute(
            "INSERT INTO points (user_id, event, amount, reason, awarded_at) VALUES (?, ?, ?, ?, ?)",
            params![
                user.as_str(),
                event.as_str(),
                amount,
                event.reason(),
                chrono::Utc::now().timestamp_millis(),
            ],
        )?;
        tracing::debug!(user = %user, event = %event, amount, "Awarded points");
        Ok(())
    }
}

impl PointsRepository for SqlitePointsRepository<'_> {
    fn total_for(&self, user: &UserId) -> Result<i64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM points WHERE user_id = ?",
            params![user.as_str()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn reputation_snapshot(&self, users: &[UserId]) -> Result<HashMap<UserId, i64>> {
        let mut snapshot = HashMap::with_capacity(users.len());
        for user in users {
            if !snapshot.contains_key(user) {
                snapshot.insert(*user, self.total_for(user)?);
            }
        }
        Ok(snapshot)
    }

    fn list_for_user(&self, user: &UserId, limit: usize) -> Result<Vec<PointsEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, event, amount, reason, awarded_at
             FROM points WHERE user_id = ?
             ORDER BY awarded_at DESC, id DESC
             LIMIT ?",
        )?;
        let entries = stmt
            .query_map(params![user.as_str(), limit], Self::parse_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_award_and_total() {
        let db = Database::open_in_memory().unwrap();
        let amounts = PointsConfig::default();
        let repo = SqlitePointsRepository::new(db.connection(), &amounts);
        let user = UserId::new();

        repo.award(&user, PointsEvent::SuggestionCreated).unwrap();
        repo.award(&user, PointsEvent::MergePerformed).unwrap();

        assert_eq!(repo.total_for(&user).unwrap(), 20);
        assert_eq!(repo.total_for(&UserId::new()).unwrap(), 0);

        let entries = repo.list_for_user(&user, 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, PointsEvent::MergePerformed);
        assert_eq!(entries[0].reason, "Successfully merged suggestions");
    }

    #[test]
    fn test_zero_amount_is_not_recorded() {
        let db = Database::open_in_memory().unwrap();
        let amounts = PointsConfig {
            suggestion_created: 0,
            ..PointsConfig::default()
        };
        let repo = SqlitePointsRepository::new(db.connection(), &amounts);
        let user = UserId::new();

        repo.award(&user, PointsEvent::SuggestionCreated).unwrap();
        assert!(repo.list_for_user(&user, 10).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_covers_unknown_users() {
        let db = Database::open_in_memory().unwrap();
        let amounts = PointsConfig::default();
        let repo = SqlitePointsRepository::new(db.connection(), &amounts);
        let known = UserId::new();
        let unknown = UserId::new();
        repo.award(&known, PointsEvent::SuggestionAccepted).unwrap();

        let snapshot = repo.reputation_snapshot(&[known, unknown, known]).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&known], 20);
        assert_eq!(snapshot[&unknown], 0);
    }
}
