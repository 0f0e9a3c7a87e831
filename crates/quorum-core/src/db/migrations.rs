//! Database migrations

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    if version < CURRENT_VERSION {
        tracing::info!("Database schema is now at version {CURRENT_VERSION}");
    }
    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

fn apply(conn: &mut Connection, version: i32, sql: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    tx.commit()?;

    tracing::debug!("Applied migration {version}");
    Ok(())
}

/// Migration to version 1: ideas, suggestions, conflict ledger, merge records
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    apply(
        conn,
        1,
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS ideas (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS suggestions (
            id TEXT PRIMARY KEY,
            idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
            author_id TEXT NOT NULL,
            parent_id TEXT REFERENCES suggestions(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'general'
                CHECK (kind IN ('improvement', 'question', 'concern', 'support', 'general')),
            state TEXT NOT NULL DEFAULT 'pending'
                CHECK (state IN ('pending', 'accepted', 'rejected')),
            accepted_by TEXT,
            accepted_at INTEGER,
            rejected_at INTEGER,
            merged_into TEXT REFERENCES suggestion_merges(id),
            created_at INTEGER NOT NULL,
            CHECK ((state = 'accepted') = (accepted_by IS NOT NULL AND accepted_at IS NOT NULL)),
            CHECK ((state = 'rejected') = (rejected_at IS NOT NULL)),
            CHECK (merged_into IS NULL OR state = 'accepted')
        );
        CREATE INDEX IF NOT EXISTS idx_suggestions_idea_created ON suggestions(idea_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_suggestions_idea_state ON suggestions(idea_id, state);
        CREATE INDEX IF NOT EXISTS idx_suggestions_author ON suggestions(author_id, state);

        CREATE TABLE IF NOT EXISTS suggestion_conflicts (
            id TEXT PRIMARY KEY,
            idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
            suggestion_1_id TEXT NOT NULL REFERENCES suggestions(id) ON DELETE CASCADE,
            suggestion_2_id TEXT NOT NULL REFERENCES suggestions(id) ON DELETE CASCADE,
            conflict_type TEXT NOT NULL,
            field_name TEXT,
            description TEXT NOT NULL,
            conflicting_values TEXT NOT NULL,
            resolution_status TEXT NOT NULL DEFAULT 'unresolved'
                CHECK (resolution_status IN ('unresolved', 'resolved', 'ignored')),
            resolved_by TEXT,
            resolution_notes TEXT,
            resolved_at INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_conflicts_idea_status
            ON suggestion_conflicts(idea_id, resolution_status);
        CREATE INDEX IF NOT EXISTS idx_conflicts_pair
            ON suggestion_conflicts(suggestion_1_id, suggestion_2_id);

        CREATE TABLE IF NOT EXISTS suggestion_merges (
            id TEXT PRIMARY KEY,
            idea_id TEXT NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
            merged_by TEXT NOT NULL,
            merged_suggestions TEXT NOT NULL,
            merge_summary TEXT NOT NULL,
            changes_applied TEXT NOT NULL,
            merge_type TEXT NOT NULL DEFAULT 'manual' CHECK (merge_type IN ('auto', 'manual')),
            has_conflicts INTEGER NOT NULL DEFAULT 0,
            conflict_resolution TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_merges_idea_created ON suggestion_merges(idea_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_merges_merged_by ON suggestion_merges(merged_by, created_at DESC);",
    )
}

/// Migration to version 2: points ledger backing reputation
fn migrate_v2(conn: &mut Connection) -> Result<()> {
    apply(
        conn,
        2,
        "CREATE TABLE IF NOT EXISTS points (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            event TEXT NOT NULL,
            amount INTEGER NOT NULL,
            reason TEXT NOT NULL,
            awarded_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_points_user ON points(user_id, awarded_at DESC);",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_creates_ledger_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();

        for table in [
            "ideas",
            "suggestions",
            "suggestion_conflicts",
            "suggestion_merges",
            "points",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_accepted_and_rejected_are_exclusive() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO ideas (id, author_id, title, created_at) VALUES ('i', 'u', 't', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO suggestions (id, idea_id, author_id, content, state, accepted_by, accepted_at, rejected_at, created_at)
             VALUES ('s', 'i', 'u', 'c', 'accepted', 'u', 1, 2, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
