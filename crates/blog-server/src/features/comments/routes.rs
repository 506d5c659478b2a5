//! Comment API routes
//!
//! - `GET /api/posts/:id/comments` - List a post's comments, oldest first
//! - `POST /api/posts/:id/comments` - Comment on a post (authenticated)
//!
//! The post segment is named `id` to match the `/posts/:id` route.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

use super::{commands::CreateCommentCommand, queries::ListCommentsQuery, types::DEFAULT_COMMENTS_LIMIT};
use crate::api::extract::ApiJson;
use crate::api::response::ApiResponse;
use crate::auth::RequestIdentity;
use crate::error::ApiResult;
use crate::features::shared::{parse_id, PageParams};
use crate::features::FeatureState;

pub fn comments_routes() -> Router<FeatureState> {
    Router::new().route("/posts/:id/comments", get(list_comments).post(create_comment))
}

async fn create_comment(
    State(state): State<FeatureState>,
    Path(post_id): Path<String>,
    identity: RequestIdentity,
    ApiJson(command): ApiJson<CreateCommentCommand>,
) -> ApiResult<Response> {
    let post_id = parse_id(&post_id, "post")?;

    let comment =
        super::commands::create::handle(state.db, &state.events, &identity, post_id, command)
            .await?;

    Ok(ApiResponse::success(comment).with_status(StatusCode::CREATED))
}

async fn list_comments(
    State(state): State<FeatureState>,
    Path(post_id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Response> {
    let post_id = parse_id(&post_id, "post")?;
    let page = params.resolve(DEFAULT_COMMENTS_LIMIT);

    let response =
        super::queries::list_by_post::handle(state.db, ListCommentsQuery { post_id, page }).await?;

    let mut meta = json!(response.pagination);
    meta["post_id"] = json!(post_id);

    Ok(ApiResponse::success_with_meta(response.items, meta).with_status(StatusCode::OK))
}
