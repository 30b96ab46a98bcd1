//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use taxpoint_core::{AuthProvider, Email, UserId, UserRole};

/// An account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Argon2 hash; absent for Google-only accounts. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub role: UserRole,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user may use the admin dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Data for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub role: UserRole,
    pub provider: AuthProvider,
}

/// Admin edit of a user. Email, password and provider are never editable here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct UserPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the avatar.
    pub image: Option<Option<String>>,
    pub role: Option<UserRole>,
}
