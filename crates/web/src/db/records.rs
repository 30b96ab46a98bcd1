//! `PostgreSQL` implementation of the admin record store.
//!
//! Dispatches each record kind to its repository.

use async_trait::async_trait;
use sqlx::PgPool;

use taxpoint_core::{ContactMessageId, EnquiryId, RecordKind, SubscriberId, UserId};

use super::{
    ContactRepository, EnquiryRepository, RepositoryError, SubscriberRepository, UserRepository,
};
use crate::models::{Record, RecordPatch};
use crate::services::records::RecordStore;

/// Record store backed by the application database.
pub struct PgRecordStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PgRecordStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore<'_> {
    async fn list(&self, kind: RecordKind) -> Result<Vec<Record>, RepositoryError> {
        let records = match kind {
            RecordKind::Enquiries => EnquiryRepository::new(self.pool)
                .list_all()
                .await?
                .into_iter()
                .map(Record::Enquiry)
                .collect(),
            RecordKind::Contacts => ContactRepository::new(self.pool)
                .list_all()
                .await?
                .into_iter()
                .map(Record::Contact)
                .collect(),
            RecordKind::Subscribers => SubscriberRepository::new(self.pool)
                .list_all()
                .await?
                .into_iter()
                .map(Record::Subscriber)
                .collect(),
            RecordKind::Users => UserRepository::new(self.pool)
                .list_all()
                .await?
                .into_iter()
                .map(Record::User)
                .collect(),
        };
        Ok(records)
    }

    async fn get(&self, kind: RecordKind, id: i32) -> Result<Option<Record>, RepositoryError> {
        let record = match kind {
            RecordKind::Enquiries => EnquiryRepository::new(self.pool)
                .get_by_id(EnquiryId::new(id))
                .await?
                .map(Record::Enquiry),
            RecordKind::Contacts => ContactRepository::new(self.pool)
                .get_by_id(ContactMessageId::new(id))
                .await?
                .map(Record::Contact),
            RecordKind::Subscribers => SubscriberRepository::new(self.pool)
                .get_by_id(SubscriberId::new(id))
                .await?
                .map(Record::Subscriber),
            RecordKind::Users => UserRepository::new(self.pool)
                .get_by_id(UserId::new(id))
                .await?
                .map(Record::User),
        };
        Ok(record)
    }

    async fn update(
        &self,
        id: i32,
        patch: &RecordPatch,
    ) -> Result<Option<Record>, RepositoryError> {
        let record = match patch {
            RecordPatch::Enquiry(p) => EnquiryRepository::new(self.pool)
                .update(EnquiryId::new(id), p)
                .await?
                .map(Record::Enquiry),
            RecordPatch::Contact(p) => ContactRepository::new(self.pool)
                .update(ContactMessageId::new(id), p)
                .await?
                .map(Record::Contact),
            RecordPatch::Subscriber(p) => SubscriberRepository::new(self.pool)
                .update(SubscriberId::new(id), p)
                .await?
                .map(Record::Subscriber),
            RecordPatch::User(p) => UserRepository::new(self.pool)
                .update(UserId::new(id), p)
                .await?
                .map(Record::User),
        };
        Ok(record)
    }

    async fn delete(&self, kind: RecordKind, id: i32) -> Result<bool, RepositoryError> {
        match kind {
            RecordKind::Enquiries => {
                EnquiryRepository::new(self.pool)
                    .delete(EnquiryId::new(id))
                    .await
            }
            RecordKind::Contacts => {
                ContactRepository::new(self.pool)
                    .delete(ContactMessageId::new(id))
                    .await
            }
            RecordKind::Subscribers => {
                SubscriberRepository::new(self.pool)
                    .delete(SubscriberId::new(id))
                    .await
            }
            RecordKind::Users => {
                UserRepository::new(self.pool)
                    .delete_unless_last_admin(UserId::new(id))
                    .await
            }
        }
    }

    async fn count_admins(&self) -> Result<i64, RepositoryError> {
        UserRepository::new(self.pool).count_admins().await
    }
}
