//! Newest-first post listing

use serde::Serialize;
use sqlx::PgPool;

use super::super::types::{Post, POST_COLUMNS};
use crate::error::AppError;
use crate::features::shared::{Page, PageMeta};

#[derive(Debug, Clone, Copy)]
pub struct ListPostsQuery {
    pub page: Page,
}

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub items: Vec<Post>,
    pub pagination: PageMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum ListPostsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: ListPostsQuery) -> Result<ListPostsResponse, ListPostsError> {
    let items: Vec<Post> = sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(query.page.limit)
    .bind(query.page.offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&pool)
        .await?;

    Ok(ListPostsResponse {
        items,
        pagination: PageMeta::new(query.page, total),
    })
}

impl From<ListPostsError> for AppError {
    fn from(err: ListPostsError) -> Self {
        match err {
            ListPostsError::Database(e) => AppError::Database(e),
        }
    }
}
