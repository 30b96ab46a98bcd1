//! Contact message repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use taxpoint_core::{ContactMessageId, Email};

use super::RepositoryError;
use crate::models::{ContactMessage, ContactPatch, NewContactMessage};

const COLUMNS: &str = "id, name, email, message, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: i32,
    name: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: ContactMessageId::new(row.id),
            name: row.name,
            email,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

/// Repository for contact message database operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a contact message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "INSERT INTO contact_message (name, email, message)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        ))
        .bind(&message.name)
        .bind(message.email.as_str())
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List all contact messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "SELECT {COLUMNS} FROM contact_message ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a contact message by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "SELECT {COLUMNS} FROM contact_message WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Apply a partial update. Returns `None` if the message does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ContactMessageId,
        patch: &ContactPatch,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactMessageRow>(&format!(
            "UPDATE contact_message
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 message = COALESCE($4, message)
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(patch.name.as_deref())
        .bind(patch.email.as_ref().map(Email::as_str))
        .bind(patch.message.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a contact message. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ContactMessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contact_message WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
