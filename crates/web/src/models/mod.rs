//! Domain models.
//!
//! These are validated domain objects, separate from the database row types
//! in `crate::db`. Each record kind also has a patch type describing a
//! partial admin edit.

pub mod contact;
pub mod enquiry;
pub mod menu;
pub mod session;
pub mod subscriber;
pub mod user;

use serde::Serialize;

use taxpoint_core::RecordKind;

pub use contact::{ContactMessage, ContactPatch, NewContactMessage};
pub use enquiry::{Enquiry, EnquiryPatch, NewEnquiry, StoredFile};
pub use menu::{MenuItem, SubMenuItem};
pub use session::CurrentUser;
pub use subscriber::{NewSubscriber, Subscriber, SubscriberPatch};
pub use user::{NewUser, User, UserPatch};

/// Any record the admin record endpoint can return.
///
/// Serializes as the inner record with no tag.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    Enquiry(Enquiry),
    Contact(ContactMessage),
    Subscriber(Subscriber),
    User(User),
}

impl Record {
    /// The kind of this record.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Enquiry(_) => RecordKind::Enquiries,
            Self::Contact(_) => RecordKind::Contacts,
            Self::Subscriber(_) => RecordKind::Subscribers,
            Self::User(_) => RecordKind::Users,
        }
    }

    /// Raw primary key.
    #[must_use]
    pub const fn id(&self) -> i32 {
        match self {
            Self::Enquiry(r) => r.id.as_i32(),
            Self::Contact(r) => r.id.as_i32(),
            Self::Subscriber(r) => r.id.as_i32(),
            Self::User(r) => r.id.as_i32(),
        }
    }
}

/// A validated partial update for one record.
///
/// The variant fixes the record kind, so a patch can never be applied to a
/// table it wasn't validated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    Enquiry(EnquiryPatch),
    Contact(ContactPatch),
    Subscriber(SubscriberPatch),
    User(UserPatch),
}

impl RecordPatch {
    /// The kind this patch applies to.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Enquiry(_) => RecordKind::Enquiries,
            Self::Contact(_) => RecordKind::Contacts,
            Self::Subscriber(_) => RecordKind::Subscribers,
            Self::User(_) => RecordKind::Users,
        }
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Enquiry(p) => *p == EnquiryPatch::default(),
            Self::Contact(p) => *p == ContactPatch::default(),
            Self::Subscriber(p) => *p == SubscriberPatch::default(),
            Self::User(p) => *p == UserPatch::default(),
        }
    }
}
