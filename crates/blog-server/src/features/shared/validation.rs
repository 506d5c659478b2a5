//! Shared validation utilities
//!
//! Provides common validation functions for request payloads and path
//! parameters. Lengths are counted in characters, not bytes.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blog_server::features::shared::validation::{validate_length, validate_email};
//!
//! validate_length(&command.title, "title", 1, 200)?;
//! validate_email(&command.email)?;
//! ```

use thiserror::Error;

/// Errors that can occur during length validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LengthValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Errors that can occur during email validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("email is required")]
    Required,

    #[error("email is not a valid address")]
    InvalidFormat,
}

/// Errors that can occur when parsing a path identifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid {resource} ID")]
pub struct IdValidationError {
    pub resource: &'static str,
}

/// Validate that `value` is between `min` and `max` characters long.
///
/// Blank values are always rejected with `Required`.
pub fn validate_length(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<(), LengthValidationError> {
    if value.trim().is_empty() {
        return Err(LengthValidationError::Required { field });
    }

    let length = value.chars().count();
    if length < min {
        return Err(LengthValidationError::TooShort { field, min });
    }
    if length > max {
        return Err(LengthValidationError::TooLong { field, max });
    }

    Ok(())
}

/// Validate an email address
///
/// # Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot, with no empty labels
/// - No whitespace
pub fn validate_email(email: &str) -> Result<(), EmailValidationError> {
    if email.is_empty() {
        return Err(EmailValidationError::Required);
    }

    if !is_valid_email(email) {
        return Err(EmailValidationError::InvalidFormat);
    }

    Ok(())
}

/// Basic structural email check
#[inline]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Parse a positive numeric identifier from a path segment
pub fn parse_id(raw: &str, resource: &'static str) -> Result<i64, IdValidationError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(IdValidationError { resource })
}

impl From<IdValidationError> for crate::error::AppError {
    fn from(err: IdValidationError) -> Self {
        crate::error::AppError::BadRequest(err.to_string())
    }
}
