//! Posts written by one author, newest first

use sqlx::PgPool;

use super::super::types::{Post, POST_COLUMNS};
use super::list::{ListPostsError, ListPostsResponse};
use crate::features::shared::{Page, PageMeta};

#[derive(Debug, Clone, Copy)]
pub struct ListPostsByAuthorQuery {
    pub author_id: i64,
    pub page: Page,
}

/// An unknown author yields an empty page rather than 404
#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ListPostsByAuthorQuery,
) -> Result<ListPostsResponse, ListPostsError> {
    let items: Vec<Post> = sqlx::query_as(&format!(
        r#"
        SELECT {POST_COLUMNS} FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(query.author_id)
    .bind(query.page.limit)
    .bind(query.page.offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
        .bind(query.author_id)
        .fetch_one(&pool)
        .await?;

    Ok(ListPostsResponse {
        items,
        pagination: PageMeta::new(query.page, total),
    })
}
