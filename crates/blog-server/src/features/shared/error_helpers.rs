//! Database error handling utilities

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Check if the error is a foreign key violation
pub fn is_foreign_key_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_foreign_key_violation();
    }
    false
}

/// Name of the violated constraint, when the database reports one
pub fn constraint_name(error: &SqlxError) -> Option<&str> {
    match error {
        SqlxError::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}
