//! User API routes
//!
//! # Route Structure
//!
//! - `POST /api/register` - Create an account and receive a token
//! - `POST /api/login` - Exchange credentials for a token
//! - `GET /api/profile` - The authenticated caller's profile

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};

use super::{
    commands::{LoginCommand, RegisterUserCommand},
    queries::GetProfileQuery,
};
use crate::api::extract::ApiJson;
use crate::api::response::ApiResponse;
use crate::auth::RequestIdentity;
use crate::error::ApiResult;
use crate::features::FeatureState;

/// Creates the users router
pub fn users_routes() -> Router<FeatureState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

/// Register a new user
///
/// # Endpoint
///
/// `POST /api/register`
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "email": "alice@example.com", "password": "secret1" }
/// ```
///
/// # Response
///
/// - `201 Created` - `{token, expires_at, user}`
/// - `400 Bad Request` - Validation error
/// - `409 Conflict` - Username or email already registered
async fn register(
    State(state): State<FeatureState>,
    ApiJson(command): ApiJson<RegisterUserCommand>,
) -> ApiResult<Response> {
    let response =
        super::commands::register::handle(state.db, state.authenticator.as_ref(), command).await?;

    Ok(ApiResponse::success(response).with_status(StatusCode::CREATED))
}

/// Log in
///
/// # Endpoint
///
/// `POST /api/login`
///
/// # Response
///
/// - `200 OK` - `{token, expires_at, user}`
/// - `400 Bad Request` - Missing email or password
/// - `401 Unauthorized` - Unknown email or wrong password
async fn login(
    State(state): State<FeatureState>,
    ApiJson(command): ApiJson<LoginCommand>,
) -> ApiResult<Response> {
    let response =
        super::commands::login::handle(state.db, state.authenticator.as_ref(), command).await?;

    Ok(ApiResponse::success(response).with_status(StatusCode::OK))
}

/// Current user's profile
///
/// # Endpoint
///
/// `GET /api/profile` (requires `Authorization: Bearer <token>`)
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id))]
async fn profile(
    State(state): State<FeatureState>,
    identity: RequestIdentity,
) -> ApiResult<Response> {
    let user = super::queries::get_profile::handle(
        state.db,
        GetProfileQuery {
            user_id: identity.user_id,
        },
    )
    .await?;

    Ok(ApiResponse::success(user).with_status(StatusCode::OK))
}
