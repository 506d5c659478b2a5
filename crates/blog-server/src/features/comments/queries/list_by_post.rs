//! Comments on a post, oldest first

use serde::Serialize;
use sqlx::PgPool;

use super::super::types::{post_exists, Comment};
use crate::error::AppError;
use crate::features::shared::{Page, PageMeta};

#[derive(Debug, Clone, Copy)]
pub struct ListCommentsQuery {
    pub post_id: i64,
    pub page: Page,
}

#[derive(Debug, Serialize)]
pub struct ListCommentsResponse {
    pub items: Vec<Comment>,
    pub pagination: PageMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum ListCommentsError {
    #[error("Post not found")]
    PostNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListCommentsQuery,
) -> Result<ListCommentsResponse, ListCommentsError> {
    if !post_exists(&pool, query.post_id).await? {
        return Err(ListCommentsError::PostNotFound(query.post_id));
    }

    let items: Vec<Comment> = sqlx::query_as(
        r#"
        SELECT id, content, post_id, author_id, created_at, updated_at
        FROM comments
        WHERE post_id = $1
        ORDER BY created_at ASC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(query.post_id)
    .bind(query.page.limit)
    .bind(query.page.offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(query.post_id)
        .fetch_one(&pool)
        .await?;

    Ok(ListCommentsResponse {
        items,
        pagination: PageMeta::new(query.page, total),
    })
}

impl From<ListCommentsError> for AppError {
    fn from(err: ListCommentsError) -> Self {
        match err {
            ListCommentsError::PostNotFound(_) => AppError::NotFound(err.to_string()),
            ListCommentsError::Database(e) => AppError::Database(e),
        }
    }
}
