//! Password hashing
//!
//! bcrypt is CPU-bound, so both operations run on the blocking thread pool.

use thiserror::Error;

/// bcrypt work factor used for new hashes.
pub const PASSWORD_HASH_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    Empty,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hash a plaintext password.
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }

    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await??;

    Ok(hash)
}

/// Check a plaintext password against a stored hash.
///
/// A malformed hash counts as a mismatch.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let password = password.to_string();
    let hash = hash.to_string();

    let matches = tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).unwrap_or_else(|e| {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        })
    })
    .await?;

    Ok(matches)
}
