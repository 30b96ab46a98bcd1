//! Authentication service.
//!
//! Password accounts (Argon2id), Google sign-in upserts and the admin
//! sign-in check.

mod error;

pub use error::AuthError;

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::SecretString;
use sqlx::PgPool;

use taxpoint_core::{AuthProvider, Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, User};
use crate::services::admin_token::admin_key_matches;
use crate::services::oauth::GoogleProfile;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash verified against when there is no real one, so unknown emails and
/// password-less accounts cost the same Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("taxpoint-no-such-account").ok());

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new credentials account with role `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName`, `InvalidEmail` or `WeakPassword` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&NewUser {
                name: name.to_string(),
                email,
                password_hash: Some(password_hash),
                image: None,
                role: UserRole::User,
                provider: AuthProvider::Credentials,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// account has no password, or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self.users.get_by_email(&email).await?;
        check_credentials(user, password)
    }

    /// Admin sign-in: shared key, then credentials, then role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for every kind of rejection.
    pub async fn admin_sign_in(
        &self,
        email: &str,
        password: &str,
        admin_key: &str,
        expected_key: &SecretString,
    ) -> Result<User, AuthError> {
        if !admin_key_matches(admin_key, expected_key) {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.login(email, password).await?;
        if !user.is_admin() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Find or create the account for a Google profile.
    ///
    /// Existing accounts keep their role and provider and only gain an avatar
    /// if they had none.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnverifiedEmail` if Google has not verified the address.
    pub async fn sign_in_with_google(&self, profile: &GoogleProfile) -> Result<User, AuthError> {
        if !profile.email_verified {
            return Err(AuthError::UnverifiedEmail);
        }
        let email = Email::parse(&profile.email)?;

        if let Some(user) = self.users.get_by_email(&email).await? {
            return match (&user.image, &profile.picture) {
                (None, Some(picture)) => {
                    Ok(self.users.set_image_if_missing(user.id, picture).await?)
                }
                _ => Ok(user),
            };
        }

        let name = profile
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.as_str().split('@').next().unwrap_or_default().to_string());

        let created = self
            .users
            .create(&NewUser {
                name,
                email: email.clone(),
                password_hash: None,
                image: profile.picture.clone(),
                role: UserRole::User,
                provider: AuthProvider::Google,
            })
            .await;

        match created {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent first sign-in for the same address
            Err(RepositoryError::Conflict(_)) => self
                .users
                .get_by_email(&email)
                .await?
                .ok_or(AuthError::InvalidCredentials),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check password policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn check_credentials(user: Option<User>, password: &str) -> Result<User, AuthError> {
    if let Some(user) = user
        && let Some(hash) = user.password_hash.as_deref()
    {
        verify_password(password, hash)?;
        return Ok(user);
    }

    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    Err(AuthError::InvalidCredentials)
}

/// Verify a password against a stored PHC hash string.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(
            hash_password("same password").unwrap(),
            hash_password("same password").unwrap()
        );
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
    }

    fn account(password_hash: Option<String>) -> User {
        User {
            id: taxpoint_core::UserId::new(7),
            name: "Anika Rao".to_string(),
            email: Email::parse("anika@taxpoint.test").unwrap(),
            password_hash,
            image: None,
            role: UserRole::User,
            provider: AuthProvider::Google,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_check_credentials() {
        let hash = hash_password("correct horse").unwrap();
        let user = check_credentials(Some(account(Some(hash.clone()))), "correct horse").unwrap();
        assert_eq!(user.id.as_i32(), 7);

        assert!(matches!(
            check_credentials(Some(account(Some(hash))), "wrong horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            check_credentials(Some(account(None)), "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            check_credentials(None, "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_dummy_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(verify_password("correct horse", hash).is_err());
    }
}
