//! Current user's profile

use sqlx::PgPool;

use super::super::types::UserResponse;
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct GetProfileQuery {
    pub user_id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetProfileError {
    /// The token is valid but the account no longer exists
    #[error("User not found")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, query: GetProfileQuery) -> Result<UserResponse, GetProfileError> {
    sqlx::query_as("SELECT id, username, email, created_at FROM users WHERE id = $1")
        .bind(query.user_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(GetProfileError::NotFound(query.user_id))
}

impl From<GetProfileError> for AppError {
    fn from(err: GetProfileError) -> Self {
        match err {
            GetProfileError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetProfileError::Database(e) => AppError::Database(e),
        }
    }
}
