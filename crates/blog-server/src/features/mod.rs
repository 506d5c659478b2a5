//! Feature modules implementing the blog API
//!
//! Each feature is a vertical slice with its own commands, queries and
//! routes.
//!
//! # Features
//!
//! - **users**: registration, login and the caller's profile
//! - **posts**: creating and listing posts
//! - **comments**: commenting on posts
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Shared response types
//!
//! Commands and queries are plain structs with a `validate()` method and a
//! standalone `handle()` function that owns the SQL.

pub mod comments;
pub mod posts;
pub mod shared;
pub mod users;

use axum::{extract::FromRef, Router};
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::events::EventLog;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
    /// Issues and validates identity tokens
    pub authenticator: Arc<dyn Authenticator>,
    /// Audit event log
    pub events: Arc<EventLog>,
}

impl FromRef<FeatureState> for Arc<dyn Authenticator> {
    fn from_ref(state: &FeatureState) -> Self {
        Arc::clone(&state.authenticator)
    }
}

/// Routes for every feature, relative to the API prefix
///
/// - `/register`, `/login`, `/profile` - Users
/// - `/posts`, `/posts/:id`, `/users/:author_id/posts` - Posts
/// - `/posts/:id/comments` - Comments
pub fn router() -> Router<FeatureState> {
    Router::new()
        .merge(users::users_routes())
        .merge(posts::posts_routes())
        .merge(comments::comments_routes())
}
