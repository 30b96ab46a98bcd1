//! Contact message domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use taxpoint_core::{ContactMessageId, Email};

/// A contact form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a contact message.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub message: String,
}

/// Admin edit of a contact message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub message: Option<String>,
}
