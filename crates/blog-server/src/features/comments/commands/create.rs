//! Create comment command

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::super::types::{post_exists, Comment};
use crate::auth::RequestIdentity;
use crate::error::AppError;
use crate::events::EventLog;
use crate::features::shared::error_helpers::{constraint_name, is_foreign_key_violation};

pub const CONTENT_MAX_LENGTH: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentCommand {
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateCommentError {
    #[error("Content is required")]
    ContentRequired,

    #[error("Content exceeds maximum length of 1000 characters")]
    ContentTooLong,

    #[error("Post not found")]
    PostNotFound(i64),

    #[error("User not found")]
    AuthorNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateCommentCommand {
    /// Content with surrounding whitespace removed, as it will be stored
    pub fn normalized_content(&self) -> &str {
        self.content.trim()
    }

    pub fn validate(&self) -> Result<(), CreateCommentError> {
        let content = self.normalized_content();
        if content.is_empty() {
            return Err(CreateCommentError::ContentRequired);
        }
        if content.chars().count() > CONTENT_MAX_LENGTH {
            return Err(CreateCommentError::ContentTooLong);
        }
        Ok(())
    }
}

/// Add a comment to `post_id` as `author`
///
/// The post is checked before the content, so commenting on a missing post
/// is a 404 whatever the body says.
#[tracing::instrument(skip(pool, events, command), fields(author_id = author.user_id))]
pub async fn handle(
    pool: PgPool,
    events: &EventLog,
    author: &RequestIdentity,
    post_id: i64,
    command: CreateCommentCommand,
) -> Result<Comment, CreateCommentError> {
    if !post_exists(&pool, post_id).await? {
        return Err(CreateCommentError::PostNotFound(post_id));
    }

    command.validate()?;

    let comment: Comment = sqlx::query_as(
        r#"
        INSERT INTO comments (content, post_id, author_id)
        VALUES ($1, $2, $3)
        RETURNING id, content, post_id, author_id, created_at, updated_at
        "#,
    )
    .bind(command.normalized_content())
    .bind(post_id)
    .bind(author.user_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // The post can disappear between the existence check and the insert
        if is_foreign_key_violation(&e) {
            return match constraint_name(&e) {
                Some(name) if name.contains("post") => CreateCommentError::PostNotFound(post_id),
                _ => CreateCommentError::AuthorNotFound(author.user_id),
            };
        }
        CreateCommentError::Database(e)
    })?;

    events.log_event(format!("user {} created comment {}", author.user_id, comment.id));
    tracing::info!(comment_id = comment.id, post_id, "Comment created");

    Ok(comment)
}

impl From<CreateCommentError> for AppError {
    fn from(err: CreateCommentError) -> Self {
        match err {
            CreateCommentError::ContentRequired | CreateCommentError::ContentTooLong => {
                AppError::Validation(err.to_string())
            },
            CreateCommentError::PostNotFound(_) | CreateCommentError::AuthorNotFound(_) => {
                AppError::NotFound(err.to_string())
            },
            CreateCommentError::Database(e) => AppError::Database(e),
        }
    }
}
