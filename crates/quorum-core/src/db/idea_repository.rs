//! Idea repository and the "may act on idea" check

use crate::error::{Error, Result};
use crate::models::{Idea, IdeaId, UserId};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_column;

/// Trait for idea storage operations
pub trait IdeaRepository {
    /// Create a new idea owned by `author`
    fn create(&self, author: &UserId, title: &str) -> Result<Idea>;

    /// Get an idea by ID
    fn get(&self, id: &IdeaId) -> Result<Option<Idea>>;
}

/// Authorization seam: whether `actor` may merge or resolve on `idea`
pub trait IdeaAccess {
    fn can_act(&self, actor: &UserId, idea: &IdeaId) -> Result<bool>;
}

/// `SQLite` implementation of `IdeaRepository`
pub struct SqliteIdeaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteIdeaRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_idea(row: &rusqlite::Row<'_>) -> rusqlite::Result<Idea> {
        Ok(Idea {
            id: parse_column(row, 0)?,
            author_id: parse_column(row, 1)?,
            title: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl IdeaRepository for SqliteIdeaRepository<'_> {
    fn create(&self, author: &UserId, title: &str) -> Result<Idea> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("idea title cannot be empty".into()));
        }

        let idea = Idea::new(*author, title);
        self.conn.execute(
            "INSERT INTO ideas (id, author_id, title, created_at) VALUES (?, ?, ?, ?)",
            params![
                idea.id.as_str(),
                idea.author_id.as_str(),
                idea.title,
                idea.created_at
            ],
        )?;
        Ok(idea)
    }

    fn get(&self, id: &IdeaId) -> Result<Option<Idea>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, author_id, title, created_at FROM ideas WHERE id = ?",
                params![id.as_str()],
                Self::parse_idea,
            )
            .optional()?)
    }
}

impl IdeaAccess for SqliteIdeaRepository<'_> {
    fn can_act(&self, actor: &UserId, idea: &IdeaId) -> Result<bool> {
        Ok(self.get(idea)?.is_some_and(|idea| idea.is_owned_by(actor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_create_and_get() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteIdeaRepository::new(db.connection());
        let author = UserId::new();

        let idea = repo.create(&author, "  Better onboarding ").unwrap();
        assert_eq!(idea.title, "Better onboarding");

        let fetched = repo.get(&idea.id).unwrap().unwrap();
        assert_eq!(fetched, idea);
    }

    #[test]
    fn test_empty_title_rejected() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteIdeaRepository::new(db.connection());
        assert!(matches!(
            repo.create(&UserId::new(), "   "),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_only_author_can_act() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteIdeaRepository::new(db.connection());
        let author = UserId::new();
        let idea = repo.create(&author, "Idea").unwrap();

        assert!(repo.can_act(&author, &idea.id).unwrap());
        assert!(!repo.can_act(&UserId::new(), &idea.id).unwrap());
        assert!(!repo.can_act(&author, &IdeaId::new()).unwrap());
    }
}
