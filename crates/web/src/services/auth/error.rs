//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] taxpoint_core::EmailError),

    /// Name missing.
    #[error("name is required")]
    MissingName,

    /// Invalid credentials (wrong password, unknown user, bad admin key or
    /// not an admin). Deliberately one variant so responses don't leak which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// OAuth provider did not verify the email address.
    #[error("email address is not verified by the provider")]
    UnverifiedEmail,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
