//! Enquiry repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use taxpoint_core::{Email, EnquiryId, EnquiryStatus};

use super::RepositoryError;
use crate::models::{Enquiry, EnquiryPatch, NewEnquiry, StoredFile};

const COLUMNS: &str = "id, full_name, email, query, files, status, created_at";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct EnquiryRow {
    id: i32,
    full_name: String,
    email: String,
    query: String,
    files: Json<Vec<StoredFile>>,
    status: EnquiryStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<EnquiryRow> for Enquiry {
    type Error = RepositoryError;

    fn try_from(row: EnquiryRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: EnquiryId::new(row.id),
            full_name: row.full_name,
            email,
            query: row.query,
            files: row.files.0,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

/// Repository for enquiry database operations.
pub struct EnquiryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EnquiryRepository<'a> {
    /// Create a new enquiry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new enquiry with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, enquiry: &NewEnquiry) -> Result<Enquiry, RepositoryError> {
        let row = sqlx::query_as::<_, EnquiryRow>(&format!(
            "INSERT INTO enquiry (full_name, email, query, files)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&enquiry.full_name)
        .bind(enquiry.email.as_str())
        .bind(&enquiry.query)
        .bind(Json(&enquiry.files))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List all enquiries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Enquiry>, RepositoryError> {
        let rows = sqlx::query_as::<_, EnquiryRow>(&format!(
            "SELECT {COLUMNS} FROM enquiry ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an enquiry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: EnquiryId) -> Result<Option<Enquiry>, RepositoryError> {
        let row = sqlx::query_as::<_, EnquiryRow>(&format!(
            "SELECT {COLUMNS} FROM enquiry WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Apply a partial update. Returns `None` if the enquiry does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: EnquiryId,
        patch: &EnquiryPatch,
    ) -> Result<Option<Enquiry>, RepositoryError> {
        let row = sqlx::query_as::<_, EnquiryRow>(&format!(
            "UPDATE enquiry
             SET full_name = COALESCE($2, full_name),
                 email = COALESCE($3, email),
                 query = COALESCE($4, query),
                 status = COALESCE($5, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(patch.full_name.as_deref())
        .bind(patch.email.as_ref().map(Email::as_str))
        .bind(patch.query.as_deref())
        .bind(patch.status)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete an enquiry. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: EnquiryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM enquiry WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
