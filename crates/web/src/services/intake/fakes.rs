//! In-memory collaborators for pipeline tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use taxpoint_core::{ContactMessageId, Email, EnquiryId, EnquiryStatus, Phone, SubscriberId};

use super::{ContactStore, EnquiryStore, SubscriberStore};
use crate::db::RepositoryError;
use crate::models::{
    ContactMessage, Enquiry, NewContactMessage, NewEnquiry, NewSubscriber, StoredFile, Subscriber,
};
use crate::services::email::{EmailError, Notifier};
use crate::services::sheets::{SheetAppender, SheetTab, SheetsError};
use crate::services::storage::{Attachment, FileStorage, StorageError};

fn next_id(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX) + 1
}

#[derive(Default)]
pub struct MemoryStore {
    enquiries: Mutex<Vec<Enquiry>>,
    subscribers: Mutex<Vec<Subscriber>>,
    contacts: Mutex<Vec<ContactMessage>>,
    conflict_on_insert: bool,
}

impl MemoryStore {
    /// Every subscriber insert fails with a unique violation.
    pub fn conflicting() -> Self {
        Self {
            conflict_on_insert: true,
            ..Self::default()
        }
    }

    pub fn enquiries(&self) -> Vec<Enquiry> {
        self.enquiries.lock().unwrap().clone()
    }

    pub fn subscribers(&self) -> Vec<Subscriber> {
        self.subscribers.lock().unwrap().clone()
    }

    pub fn contacts(&self) -> Vec<ContactMessage> {
        self.contacts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EnquiryStore for MemoryStore {
    async fn insert_enquiry(&self, new: &NewEnquiry) -> Result<Enquiry, RepositoryError> {
        let mut rows = self.enquiries.lock().unwrap();
        let enquiry = Enquiry {
            id: EnquiryId::new(next_id(rows.len())),
            full_name: new.full_name.clone(),
            email: new.email.clone(),
            query: new.query.clone(),
            files: new.files.clone(),
            status: EnquiryStatus::Pending,
            created_at: Utc::now(),
        };
        rows.push(enquiry.clone());
        Ok(enquiry)
    }
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn find_subscriber(
        &self,
        email: Option<&Email>,
        phone: Option<&Phone>,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        let rows = self.subscribers.lock().unwrap();
        Ok(rows
            .iter()
            .find(|s| {
                (email.is_some() && s.email.as_ref() == email)
                    || (phone.is_some() && s.phone.as_ref() == phone)
            })
            .cloned())
    }

    async fn insert_subscriber(&self, new: &NewSubscriber) -> Result<Subscriber, RepositoryError> {
        if self.conflict_on_insert {
            return Err(RepositoryError::Conflict("already subscribed".to_string()));
        }
        let mut rows = self.subscribers.lock().unwrap();
        let subscriber = Subscriber {
            id: SubscriberId::new(next_id(rows.len())),
            email: new.email.clone(),
            phone: new.phone.clone(),
            subscribed_at: Utc::now(),
        };
        rows.push(subscriber.clone());
        Ok(subscriber)
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(
        &self,
        new: &NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError> {
        let mut rows = self.contacts.lock().unwrap();
        let message = ContactMessage {
            id: ContactMessageId::new(next_id(rows.len())),
            name: new.name.clone(),
            email: new.email.clone(),
            message: new.message.clone(),
            created_at: Utc::now(),
        };
        rows.push(message.clone());
        Ok(message)
    }
}

#[derive(Default)]
pub struct FakeStorage {
    uploaded: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeStorage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Names of the files uploaded so far.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStorage for FakeStorage {
    async fn upload(&self, attachment: &Attachment) -> Result<StoredFile, StorageError> {
        if self.fail {
            return Err(StorageError::Api {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        self.uploaded
            .lock()
            .unwrap()
            .push(attachment.file_name.clone());
        Ok(StoredFile {
            url: format!("https://cdn.test/{}", attachment.file_name),
            storage_id: format!("enquiries/{}", attachment.file_name),
        })
    }
}

#[derive(Default)]
pub struct FakeSheets {
    rows: Mutex<Vec<(SheetTab, Vec<String>)>>,
    fail: bool,
}

impl FakeSheets {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<(SheetTab, Vec<String>)> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetAppender for FakeSheets {
    async fn append_row(&self, tab: SheetTab, row: Vec<String>) -> Result<(), SheetsError> {
        if self.fail {
            return Err(SheetsError::Api {
                status: 403,
                message: "permission denied".to_string(),
            });
        }
        self.rows.lock().unwrap().push((tab, row));
        Ok(())
    }
}

/// Records `kind:recipient` for each message instead of sending it.
#[derive(Default)]
pub struct FakeNotifier {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, entry: String) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::InvalidAddress("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn enquiry_received(&self, enquiry: &Enquiry) -> Result<(), EmailError> {
        self.record(format!("enquiry:{}", enquiry.email))
    }

    async fn new_subscriber(&self, subscriber: &Subscriber) -> Result<(), EmailError> {
        let contact = subscriber
            .email
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| subscriber.phone.as_ref().map(ToString::to_string))
            .unwrap_or_default();
        self.record(format!("subscriber:{contact}"))
    }

    async fn new_contact_message(&self, message: &ContactMessage) -> Result<(), EmailError> {
        self.record(format!("contact:{}", message.email))
    }
}
