//! Subscriber repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use taxpoint_core::{Email, Phone, SubscriberId};

use super::RepositoryError;
use crate::models::{NewSubscriber, Subscriber, SubscriberPatch};

const COLUMNS: &str = "id, email, phone, subscribed_at";

#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: i32,
    email: Option<String>,
    phone: Option<String>,
    subscribed_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
        let phone = row
            .phone
            .as_deref()
            .map(Phone::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
            })?;

        Ok(Self {
            id: SubscriberId::new(row.id),
            email,
            phone,
            subscribed_at: row.subscribed_at,
        })
    }
}

/// Repository for subscriber database operations.
pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a subscriber.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone is already subscribed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, subscriber: &NewSubscriber) -> Result<Subscriber, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "INSERT INTO subscriber (email, phone)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        ))
        .bind(subscriber.email.as_ref().map(Email::as_str))
        .bind(subscriber.phone.as_ref().map(Phone::as_str))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "already subscribed"))?;

        row.try_into()
    }

    /// Find a subscriber whose email or phone matches either value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_matching(
        &self,
        email: Option<&Email>,
        phone: Option<&Phone>,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM subscriber
             WHERE ($1::text IS NOT NULL AND email = $1)
                OR ($2::text IS NOT NULL AND phone = $2)
             LIMIT 1"
        ))
        .bind(email.map(Email::as_str))
        .bind(phone.map(Phone::as_str))
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all subscribers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Subscriber>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM subscriber ORDER BY subscribed_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a subscriber by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: SubscriberId) -> Result<Option<Subscriber>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "SELECT {COLUMNS} FROM subscriber WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Apply a partial update. Returns `None` if the subscriber does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email or phone belongs to
    /// another subscriber.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: SubscriberId,
        patch: &SubscriberPatch,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let email = patch.email.as_ref().map(|e| e.as_ref().map(Email::as_str));
        let phone = patch.phone.as_ref().map(|p| p.as_ref().map(Phone::as_str));

        let row = sqlx::query_as::<_, SubscriberRow>(&format!(
            "UPDATE subscriber
             SET email = CASE WHEN $2 THEN $3 ELSE email END,
                 phone = CASE WHEN $4 THEN $5 ELSE phone END
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(email.is_some())
        .bind(email.flatten())
        .bind(phone.is_some())
        .bind(phone.flatten())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "already subscribed"))?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a subscriber. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: SubscriberId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM subscriber WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
