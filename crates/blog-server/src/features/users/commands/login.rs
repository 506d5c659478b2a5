//! Login command

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::super::types::{AuthResponse, UserRecord, UserResponse};
use crate::auth::password::{verify_password, PasswordError};
use crate::auth::{AuthError, Authenticator};
use crate::error::AppError;
use crate::features::shared::validation::{validate_email, EmailValidationError};

/// Command to exchange credentials for a token
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when logging in
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    InvalidEmail(#[from] EmailValidationError),

    #[error("password is required")]
    PasswordRequired,

    /// Unknown email and wrong password are reported the same way
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password verification failed: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Token issuance failed: {0}")]
    Token(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(LoginError::PasswordRequired);
        }
        Ok(())
    }
}

/// Handler function for logging in
#[tracing::instrument(skip(pool, authenticator, command), fields(email = %command.email))]
pub async fn handle(
    pool: PgPool,
    authenticator: &dyn Authenticator,
    command: LoginCommand,
) -> Result<AuthResponse, LoginError> {
    command.validate()?;

    let record: Option<UserRecord> = sqlx::query_as(
        r#"
        SELECT id, username, email, password_hash, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(&command.email)
    .fetch_optional(&pool)
    .await?;

    let Some(record) = record else {
        tracing::info!("Login failed: unknown email");
        return Err(LoginError::InvalidCredentials);
    };

    if !verify_password(&command.password, &record.password_hash).await? {
        tracing::info!(user_id = record.id, "Login failed: wrong password");
        return Err(LoginError::InvalidCredentials);
    }

    let user = UserResponse::from(record);
    let issued = authenticator.issue(user.id, &user.email, &user.username)?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    })
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidEmail(_) | LoginError::PasswordRequired => {
                AppError::Validation(err.to_string())
            },
            LoginError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            LoginError::PasswordHash(_) | LoginError::Token(_) => {
                AppError::Internal(err.to_string())
            },
            LoginError::Database(e) => AppError::Database(e),
        }
    }
}
