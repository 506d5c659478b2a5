//! Register user command
//!
//! Creates an account and signs the caller in straight away.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::super::types::{AuthResponse, UserResponse};
use crate::auth::password::{hash_password, PasswordError};
use crate::auth::{AuthError, Authenticator};
use crate::error::AppError;
use crate::features::shared::error_helpers::is_unique_violation;
use crate::features::shared::validation::{
    validate_email, validate_length, EmailValidationError, LengthValidationError,
};

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 6;
/// bcrypt only looks at the first 72 bytes
pub const PASSWORD_MAX_LENGTH: usize = 72;

/// Command to register a new user
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterUserCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for RegisterUserCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterUserCommand")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur when registering a user
#[derive(Debug, thiserror::Error)]
pub enum RegisterUserError {
    #[error("{0}")]
    Validation(#[from] LengthValidationError),

    #[error("{0}")]
    InvalidEmail(#[from] EmailValidationError),

    #[error("User already exists")]
    AlreadyExists,

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] PasswordError),

    #[error("Token issuance failed: {0}")]
    Token(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RegisterUserCommand {
    /// Validates the command parameters
    ///
    /// - Username must be 3-50 characters
    /// - Email must be a valid address
    /// - Password must be at least 6 characters
    pub fn validate(&self) -> Result<(), RegisterUserError> {
        validate_length(&self.username, "username", USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH)?;
        validate_email(&self.email)?;
        validate_length(&self.password, "password", PASSWORD_MIN_LENGTH, PASSWORD_MAX_LENGTH)?;
        Ok(())
    }
}

/// Handler function for registering users
///
/// Rejects the command when the username or email is already taken, stores a
/// bcrypt hash of the password and issues a token for the new account.
#[tracing::instrument(
    skip(pool, authenticator, command),
    fields(username = %command.username, email = %command.email)
)]
pub async fn handle(
    pool: PgPool,
    authenticator: &dyn Authenticator,
    command: RegisterUserCommand,
) -> Result<AuthResponse, RegisterUserError> {
    command.validate()?;

    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)",
    )
    .bind(&command.email)
    .bind(&command.username)
    .fetch_one(&pool)
    .await?;

    if taken {
        return Err(RegisterUserError::AlreadyExists);
    }

    let password_hash = hash_password(&command.password).await?;

    let user: UserResponse = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, created_at
        "#,
    )
    .bind(&command.username)
    .bind(&command.email)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration
        if is_unique_violation(&e) {
            return RegisterUserError::AlreadyExists;
        }
        RegisterUserError::Database(e)
    })?;

    let issued = authenticator.issue(user.id, &user.email, &user.username)?;

    tracing::info!(user_id = user.id, "User registered");

    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    })
}

impl From<RegisterUserError> for AppError {
    fn from(err: RegisterUserError) -> Self {
        match err {
            RegisterUserError::Validation(_) | RegisterUserError::InvalidEmail(_) => {
                AppError::Validation(err.to_string())
            },
            RegisterUserError::AlreadyExists => AppError::Conflict(err.to_string()),
            RegisterUserError::PasswordHash(_) | RegisterUserError::Token(_) => {
                AppError::Internal(err.to_string())
            },
            RegisterUserError::Database(e) => AppError::Database(e),
        }
    }
}
