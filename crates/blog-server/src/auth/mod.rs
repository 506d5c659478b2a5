//! Authentication
//!
//! - [`token`]: signed, time-bound identity tokens (JWT, HS256)
//! - [`password`]: bcrypt hashing and verification
//! - [`identity`]: the [`RequestIdentity`] extractor used by protected routes
//!
//! Handlers depend on the [`Authenticator`] trait rather than a concrete
//! token implementation, so tests can substitute their own.

pub mod identity;
pub mod password;
pub mod token;

pub use identity::RequestIdentity;
pub use token::{AuthError, Claims, IssuedToken, JwtAuthenticator};

/// Issues and validates identity tokens.
pub trait Authenticator: Send + Sync {
    /// Sign a new token for the given user.
    fn issue(&self, user_id: i64, email: &str, username: &str) -> Result<IssuedToken, AuthError>;

    /// Verify a token and return its claims.
    ///
    /// Fails with [`AuthError::ExpiredToken`] once the expiry has passed and
    /// [`AuthError::InvalidToken`] for anything else that does not verify.
    fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}
