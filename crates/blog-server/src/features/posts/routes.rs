//! Post API routes
//!
//! # Route Structure
//!
//! - `GET /api/posts` - List posts, newest first
//! - `POST /api/posts` - Create a post (authenticated)
//! - `GET /api/posts/:id` - Get a single post
//! - `GET /api/users/:author_id/posts` - List one author's posts

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

use super::{
    commands::CreatePostCommand,
    queries::{GetPostQuery, ListPostsByAuthorQuery, ListPostsQuery},
    types::DEFAULT_POSTS_LIMIT,
};
use crate::api::extract::ApiJson;
use crate::api::response::ApiResponse;
use crate::auth::RequestIdentity;
use crate::error::ApiResult;
use crate::features::shared::{parse_id, PageParams};
use crate::features::FeatureState;

/// Creates the posts router
pub fn posts_routes() -> Router<FeatureState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post))
        .route("/users/:author_id/posts", get(list_posts_by_author))
}

/// Create a post as the authenticated user
///
/// # Response
///
/// - `201 Created` - The stored post
/// - `400 Bad Request` - Validation error
/// - `401 Unauthorized` - Missing or invalid token
async fn create_post(
    State(state): State<FeatureState>,
    identity: RequestIdentity,
    ApiJson(command): ApiJson<CreatePostCommand>,
) -> ApiResult<Response> {
    let post = super::commands::create::handle(state.db, &state.events, &identity, command).await?;

    Ok(ApiResponse::success(post).with_status(StatusCode::CREATED))
}

/// List posts
///
/// # Query Parameters
///
/// - `limit` - Page size, default 10, at most 100
/// - `offset` - Rows to skip, default 0
async fn list_posts(
    State(state): State<FeatureState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let page = params.resolve(DEFAULT_POSTS_LIMIT);
    let response = super::queries::list::handle(state.db, ListPostsQuery { page }).await?;

    Ok(ApiResponse::success_with_meta(response.items, json!(response.pagination))
        .with_status(StatusCode::OK))
}

/// Get a single post
///
/// Authentication is optional here; a valid token only adds the caller to
/// the request trace.
async fn get_post(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
    identity: Option<RequestIdentity>,
) -> ApiResult<Response> {
    let id = parse_id(&id, "post")?;

    if let Some(identity) = &identity {
        tracing::debug!(post_id = id, user_id = identity.user_id, "Authenticated post read");
    }

    let post = super::queries::get::handle(state.db, GetPostQuery { id }).await?;

    Ok(ApiResponse::success(post).with_status(StatusCode::OK))
}

/// List one author's posts, paginated like [`list_posts`]
async fn list_posts_by_author(
    State(state): State<FeatureState>,
    Path(author_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let author_id = parse_id(&author_id, "user")?;
    let page = params.resolve(DEFAULT_POSTS_LIMIT);

    let response = super::queries::list_by_author::handle(
        state.db,
        ListPostsByAuthorQuery { author_id, page },
    )
    .await?;

    let mut meta = json!(response.pagination);
    meta["author_id"] = json!(author_id);

    Ok(ApiResponse::success_with_meta(response.items, meta).with_status(StatusCode::OK))
}
