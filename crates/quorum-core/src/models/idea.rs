//! Idea model

use serde::{Deserialize, Serialize};

use super::{IdeaId, UserId};

/// The parent proposal that suggestions comment on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    /// Unique identifier
    pub id: IdeaId,
    /// Owner of the idea, the only user allowed to merge or resolve on it
    pub author_id: UserId,
    /// Short title
    pub title: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Idea {
    /// Create a new idea owned by `author_id`
    #[must_use]
    pub fn new(author_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: IdeaId::new(),
            author_id,
            title: title.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Whether `actor` owns this idea
    pub fn is_owned_by(&self, actor: &UserId) -> bool {
        self.author_id == *actor
    }
}
