//! Generic admin record service.
//!
//! The `{kind}` path segment picks the model and the patch schema. Every
//! operation first resolves the kind, so an unknown kind fails before any
//! query runs.

mod patch;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use taxpoint_core::{FieldErrors, RecordKind, UnknownRecordKind};

use crate::db::RepositoryError;
use crate::models::{Record, RecordPatch};

pub use patch::parse_patch;

/// Errors from the admin record service.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The kind segment names no known record type.
    #[error(transparent)]
    UnknownKind(#[from] UnknownRecordKind),

    /// The patch failed validation.
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),

    /// No record with this id.
    #[error("{kind} record {id} not found")]
    NotFound { kind: RecordKind, id: i32 },

    /// The user is the only remaining admin.
    #[error("cannot delete the last admin")]
    LastAdmin,

    /// A unique constraint rejected the change.
    #[error("{0}")]
    Conflict(String),

    /// Database error.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for RecordError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

/// Storage for every admin-editable record kind.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of a kind, newest first.
    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, RepositoryError>;

    async fn get(&self, kind: RecordKind, id: i32) -> Result<Option<Record>, RepositoryError>;

    /// Apply a validated patch. `None` if the record is gone.
    async fn update(&self, id: i32, patch: &RecordPatch)
    -> Result<Option<Record>, RepositoryError>;

    /// Delete by id. For users this refuses to remove the last admin and
    /// returns `false` in that case.
    async fn delete(&self, kind: RecordKind, id: i32) -> Result<bool, RepositoryError>;

    async fn count_admins(&self) -> Result<i64, RepositoryError>;
}

/// Admin CRUD over any [`RecordKind`].
pub struct RecordService<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> RecordService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// List every record of a kind.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UnknownKind` or a database error.
    #[instrument(skip(self))]
    pub async fn list(&self, kind: &str) -> Result<Vec<Record>, RecordError> {
        let kind: RecordKind = kind.parse()?;
        Ok(self.store.list(kind).await?)
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::UnknownKind`, `NotFound` or a database error.
    #[instrument(skip(self))]
    pub async fn get(&self, kind: &str, id: i32) -> Result<Record, RecordError> {
        let kind: RecordKind = kind.parse()?;
        self.find(kind, id).await
    }

    /// Validate `body` against the kind's schema and apply it.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Invalid` with per-field detail, `NotFound`,
    /// `Conflict` on a duplicate unique value, or a database error.
    #[instrument(skip(self, body))]
    pub async fn update(
        &self,
        kind: &str,
        id: i32,
        body: &serde_json::Value,
    ) -> Result<Record, RecordError> {
        let kind: RecordKind = kind.parse()?;
        let patch = parse_patch(kind, body).map_err(RecordError::Invalid)?;
        let current = self.find(kind, id).await?;

        if patch.is_empty() {
            return Ok(current);
        }

        if let (RecordPatch::Subscriber(p), Record::Subscriber(s)) = (&patch, &current)
            && !p.keeps_contact(s)
        {
            return Err(RecordError::Invalid(FieldErrors::single(
                "email",
                "a subscriber needs an email address or a phone number",
            )));
        }

        let updated = self
            .store
            .update(id, &patch)
            .await?
            .ok_or(RecordError::NotFound { kind, id })?;

        tracing::info!(%kind, id, "Record updated");
        Ok(updated)
    }

    /// Delete a record. The last admin account cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::NotFound`, `LastAdmin` or a database error.
    #[instrument(skip(self))]
    pub async fn delete(&self, kind: &str, id: i32) -> Result<(), RecordError> {
        let kind: RecordKind = kind.parse()?;
        let current = self.find(kind, id).await?;

        if let Record::User(user) = &current
            && user.is_admin()
            && self.store.count_admins().await? <= 1
        {
            return Err(RecordError::LastAdmin);
        }

        if !self.store.delete(kind, id).await? {
            // Only an admin row can be refused by the SQL last-admin guard.
            // Anything else vanished between the read and the delete.
            let was_admin = matches!(&current, Record::User(user) if user.is_admin());
            return Err(if was_admin {
                RecordError::LastAdmin
            } else {
                RecordError::NotFound { kind, id }
            });
        }

        tracing::info!(%kind, id, "Record deleted");
        Ok(())
    }

    async fn find(&self, kind: RecordKind, id: i32) -> Result<Record, RecordError> {
        self.store
            .get(kind, id)
            .await?
            .ok_or(RecordError::NotFound { kind, id })
    }
}
