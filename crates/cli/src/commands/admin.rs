//! Admin account management.
//!
//! ```bash
//! tp-cli admin create -e owner@taxpoint.test -n "Owner" -p 'long-password'
//! ```
//!
//! An existing account with the same email is promoted to admin and its
//! password replaced.

use taxpoint_core::{Email, EmailError};
use taxpoint_web::db::{RepositoryError, UserRepository};
use taxpoint_web::services::auth::{AuthError, hash_password, validate_password};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Name is required")]
    MissingName,

    #[error("{0}")]
    Password(#[from] AuthError),

    #[error("Could not save admin: {0}")]
    Repository(#[from] RepositoryError),
}

/// Check the arguments before touching the database.
fn validate(email: &str, name: &str, password: &str) -> Result<Email, AdminError> {
    let email = Email::parse(email)?;
    if name.trim().is_empty() {
        return Err(AdminError::MissingName);
    }
    validate_password(password)?;
    Ok(email)
}

/// Create or promote an admin account.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or the upsert fails.
pub async fn create(email: &str, name: &str, password: &str) -> Result<(), AdminError> {
    let email = validate(email, name, password)?;
    let password_hash = hash_password(password)?;

    let pool = super::connect().await?;
    let user = UserRepository::new(&pool)
        .upsert_admin(name.trim(), &email, &password_hash)
        .await?;

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        "Admin account ready"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            validate("not-an-email", "Owner", "long-enough-password"),
            Err(AdminError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate("owner@taxpoint.test", "  ", "long-enough-password"),
            Err(AdminError::MissingName)
        ));
        assert!(matches!(
            validate("owner@taxpoint.test", "Owner", "short"),
            Err(AdminError::Password(AuthError::WeakPassword(_)))
        ));
    }

    #[test]
    fn test_validate_normalizes_email() {
        let email = validate(" Owner@Taxpoint.test ", "Owner", "long-enough-password").unwrap();
        assert_eq!(email.as_str(), "owner@taxpoint.test");
    }
}
