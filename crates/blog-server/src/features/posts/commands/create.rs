//! Create post command

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::super::types::Post;
use crate::auth::RequestIdentity;
use crate::error::AppError;
use crate::events::EventLog;
use crate::features::shared::error_helpers::is_foreign_key_violation;
use crate::features::shared::validation::{validate_length, LengthValidationError};

pub const TITLE_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostCommand {
    pub title: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreatePostError {
    #[error("{0}")]
    Validation(#[from] LengthValidationError),

    /// The author was deleted after the token was issued
    #[error("User not found")]
    AuthorNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreatePostCommand {
    /// Title must be 1-200 characters; content must not be blank
    pub fn validate(&self) -> Result<(), CreatePostError> {
        validate_length(&self.title, "title", 1, TITLE_MAX_LENGTH)?;
        validate_length(&self.content, "content", 1, usize::MAX)?;
        Ok(())
    }
}

/// Insert a post owned by `author` and record the creation event
#[tracing::instrument(skip(pool, events, command), fields(author_id = author.user_id))]
pub async fn handle(
    pool: PgPool,
    events: &EventLog,
    author: &RequestIdentity,
    command: CreatePostCommand,
) -> Result<Post, CreatePostError> {
    command.validate()?;

    let post: Post = sqlx::query_as(
        r#"
        INSERT INTO posts (title, content, author_id)
        VALUES ($1, $2, $3)
        RETURNING id, title, content, author_id, created_at
        "#,
    )
    .bind(&command.title)
    .bind(&command.content)
    .bind(author.user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_foreign_key_violation(&e) {
            return CreatePostError::AuthorNotFound(author.user_id);
        }
        CreatePostError::Database(e)
    })?;

    events.log_event(format!("user {} created post {}", author.user_id, post.id));
    tracing::info!(post_id = post.id, "Post created");

    Ok(post)
}

impl From<CreatePostError> for AppError {
    fn from(err: CreatePostError) -> Self {
        match err {
            CreatePostError::Validation(_) => AppError::Validation(err.to_string()),
            CreatePostError::AuthorNotFound(_) => AppError::NotFound(err.to_string()),
            CreatePostError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(title: &str, content: &str) -> CreatePostCommand {
        CreatePostCommand {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command("Hello", "World").validate().is_ok());
        assert!(command(&"t".repeat(200), "x").validate().is_ok());
    }

    #[test]
    fn test_validation_title() {
        assert_eq!(
            command("", "body").validate().unwrap_err().to_string(),
            "title is required"
        );
        assert_eq!(
            command(&"t".repeat(201), "body").validate().unwrap_err().to_string(),
            "title must be at most 200 characters"
        );
    }

    #[test]
    fn test_validation_content() {
        assert_eq!(
            command("Hello", "   ").validate().unwrap_err().to_string(),
            "content is required"
        );
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::from(command("", "").validate().unwrap_err());
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
