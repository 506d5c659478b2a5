use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Column list shared by every post query
pub(crate) const POST_COLUMNS: &str = "id, title, content, author_id, created_at";

/// Posts default to a smaller page than comments
pub const DEFAULT_POSTS_LIMIT: i64 = 10;
