//! Single post lookup

use sqlx::PgPool;

use super::super::types::{Post, POST_COLUMNS};
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct GetPostQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetPostError {
    #[error("Post not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetPostQuery) -> Result<Post, GetPostError> {
    sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(query.id)
        .fetch_optional(&pool)
        .await?
        .ok_or(GetPostError::NotFound(query.id))
}

impl From<GetPostError> for AppError {
    fn from(err: GetPostError) -> Self {
        match err {
            GetPostError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetPostError::Database(e) => AppError::Database(e),
        }
    }
}
