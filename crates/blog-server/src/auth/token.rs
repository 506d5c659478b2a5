//! JWT identity tokens
//!
//! Tokens are HS256-signed and carry the user's id, email and username.
//! Expiry is always checked against the server clock, separately from the
//! signature check, so a token issued with a zero TTL is already expired.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::Authenticator;

/// Issuer written to and required from every token.
pub const TOKEN_ISSUER: &str = "blog-api";

/// Subject written to every token.
pub const TOKEN_SUBJECT: &str = "user";

/// Token errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Claims carried by an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    pub iss: String,
    pub sub: String,
}

/// A freshly signed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token authenticator with a fixed secret and TTL
pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuthenticator {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_at` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Signing(format!("token TTL out of range: {}", e)))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("token expiry is out of range".to_string()))?;

        let claims = Claims {
            user_id,
            email: email.to_string(),
            username: username.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            sub: TOKEN_SUBJECT.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Validate a token as if the current time were `now`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;
        let claims = data.claims;

        if claims.sub != TOKEN_SUBJECT {
            return Err(AuthError::InvalidToken);
        }

        let now = now.timestamp();
        if now < claims.nbf {
            return Err(AuthError::InvalidToken);
        }
        if now >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}

impl Authenticator for JwtAuthenticator {
    fn issue(&self, user_id: i64, email: &str, username: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, email, username, Utc::now())
    }

    fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }
}

impl std::fmt::Debug for JwtAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthenticator")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
