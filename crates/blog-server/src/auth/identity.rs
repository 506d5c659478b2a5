//! Authenticated caller extracted from the `Authorization` header

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use super::{Authenticator, Claims};
use crate::error::AppError;

/// The user a request was made on behalf of.
///
/// Add it as a handler parameter to require a valid bearer token; the
/// request is rejected with 401 otherwise. Use `Option<RequestIdentity>`
/// where authentication is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: i64,
    pub email: String,
    pub username: String,
}

impl From<Claims> for RequestIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            username: claims.username,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
    Arc<dyn Authenticator>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Authorization header is required".to_string())
        })?;

        let authenticator = Arc::<dyn Authenticator>::from_ref(state);
        let claims = authenticator.validate(token)?;

        Ok(claims.into())
    }
}

/// Token from an `Authorization: Bearer <token>` header. The scheme is
/// case-insensitive.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }

    Some(token)
}
