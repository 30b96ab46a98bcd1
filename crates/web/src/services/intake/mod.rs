//! Public form pipelines: enquiries, subscriptions and contact messages.
//!
//! Each pipeline validates its input, then runs its side effects in order
//! (upload, persist, spreadsheet, email). The first failing step aborts the
//! request. Earlier steps are not undone, so a spreadsheet outage can leave
//! a saved enquiry with no row and no confirmation email.

mod contact;
mod enquiry;
mod subscription;

#[cfg(test)]
mod fakes;

use async_trait::async_trait;
use thiserror::Error;

use taxpoint_core::{Email, FieldErrors, Phone};

use crate::db::{ContactRepository, EnquiryRepository, RepositoryError, SubscriberRepository};
use crate::models::{
    ContactMessage, Enquiry, NewContactMessage, NewEnquiry, NewSubscriber, Subscriber,
};
use crate::services::email::{EmailError, Notifier};
use crate::services::sheets::{SheetAppender, SheetsError};
use crate::services::storage::{FileStorage, StorageError};

pub use contact::ContactSubmission;
pub use enquiry::{EnquirySubmission, MAX_ATTACHMENTS, MAX_ENQUIRY_BODY_BYTES};
pub use subscription::SubscriptionRequest;

/// Errors from a form pipeline.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Invalid(FieldErrors),

    /// Subscription without an email or a phone.
    #[error("an email address or phone number is required")]
    MissingContact,

    /// A subscriber with this email or phone already exists.
    #[error("already subscribed")]
    AlreadySubscribed,

    /// An attachment could not be uploaded.
    #[error("file upload failed: {0}")]
    Upload(#[from] StorageError),

    /// The record could not be saved.
    #[error("saving the record failed: {0}")]
    Persist(#[from] RepositoryError),

    /// The spreadsheet row could not be appended.
    #[error("spreadsheet append failed: {0}")]
    Spreadsheet(#[from] SheetsError),

    /// The email could not be sent.
    #[error("email delivery failed: {0}")]
    Notify(#[from] EmailError),
}

impl IntakeError {
    /// Short client-safe name of the side effect that failed, if any.
    #[must_use]
    pub const fn failed_step(&self) -> Option<&'static str> {
        match self {
            Self::Upload(_) => Some("file upload failed"),
            Self::Persist(_) => Some("saving the record failed"),
            Self::Spreadsheet(_) => Some("spreadsheet append failed"),
            Self::Notify(_) => Some("email delivery failed"),
            Self::Invalid(_) | Self::MissingContact | Self::AlreadySubscribed => None,
        }
    }
}

/// Persists enquiries.
#[async_trait]
pub trait EnquiryStore: Send + Sync {
    async fn insert_enquiry(&self, enquiry: &NewEnquiry) -> Result<Enquiry, RepositoryError>;
}

/// Persists and looks up subscribers.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// A subscriber whose email or phone equals either given value.
    async fn find_subscriber(
        &self,
        email: Option<&Email>,
        phone: Option<&Phone>,
    ) -> Result<Option<Subscriber>, RepositoryError>;

    async fn insert_subscriber(
        &self,
        subscriber: &NewSubscriber,
    ) -> Result<Subscriber, RepositoryError>;
}

/// Persists contact messages.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn insert_contact(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError>;
}

#[async_trait]
impl EnquiryStore for EnquiryRepository<'_> {
    async fn insert_enquiry(&self, enquiry: &NewEnquiry) -> Result<Enquiry, RepositoryError> {
        self.create(enquiry).await
    }
}

#[async_trait]
impl SubscriberStore for SubscriberRepository<'_> {
    async fn find_subscriber(
        &self,
        email: Option<&Email>,
        phone: Option<&Phone>,
    ) -> Result<Option<Subscriber>, RepositoryError> {
        self.find_matching(email, phone).await
    }

    async fn insert_subscriber(
        &self,
        subscriber: &NewSubscriber,
    ) -> Result<Subscriber, RepositoryError> {
        self.create(subscriber).await
    }
}

#[async_trait]
impl ContactStore for ContactRepository<'_> {
    async fn insert_contact(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessage, RepositoryError> {
        self.create(message).await
    }
}

/// Runs the public form pipelines against a set of collaborators.
pub struct IntakeService<'a> {
    storage: &'a dyn FileStorage,
    sheets: &'a dyn SheetAppender,
    notifier: &'a dyn Notifier,
}

impl<'a> IntakeService<'a> {
    #[must_use]
    pub const fn new(
        storage: &'a dyn FileStorage,
        sheets: &'a dyn SheetAppender,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            storage,
            sheets,
            notifier,
        }
    }
}

/// Trim a required text field, recording an error if it is blank or too long.
fn required_text(errors: &mut FieldErrors, field: &str, value: &str, max_chars: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, format!("{field} is required"));
    } else if value.chars().count() > max_chars {
        errors.add(field, format!("{field} must be at most {max_chars} characters"));
    }
    value.to_string()
}

/// Parse a required email field, recording an error on failure.
fn required_email(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Email> {
    match Email::parse(value) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_step_hides_details() {
        let err = IntakeError::Spreadsheet(SheetsError::Api {
            status: 403,
            message: "token for sheet abc123 expired".to_string(),
        });
        assert_eq!(err.failed_step(), Some("spreadsheet append failed"));
        assert_eq!(IntakeError::MissingContact.failed_step(), None);
    }

    #[test]
    fn test_required_text() {
        let mut errors = FieldErrors::new();
        assert_eq!(required_text(&mut errors, "name", "  Asha ", 10), "Asha");
        required_text(&mut errors, "query", "   ", 10);
        required_text(&mut errors, "title", "abcdefghijk", 10);
        assert!(!errors.has("name"));
        assert!(errors.has("query"));
        assert!(errors.has("title"));
    }
}
