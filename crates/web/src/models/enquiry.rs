//! Enquiry domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taxpoint_core::{Email, EnquiryId, EnquiryStatus};

/// A file uploaded to external storage as part of an enquiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Public URL of the uploaded file.
    pub url: String,
    /// Identifier assigned by the storage service.
    pub storage_id: String,
}

/// A consultation request (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub full_name: String,
    pub email: Email,
    pub query: String,
    /// References to uploaded files, in upload order.
    pub files: Vec<StoredFile>,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
}

impl Enquiry {
    /// File URLs joined with `", "`, as written to the spreadsheet.
    #[must_use]
    pub fn file_urls(&self) -> String {
        self.files
            .iter()
            .map(|f| f.url.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Data for inserting an enquiry. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct NewEnquiry {
    pub full_name: String,
    pub email: Email,
    pub query: String,
    pub files: Vec<StoredFile>,
}

/// Admin edit of an enquiry. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnquiryPatch {
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub query: Option<String>,
    pub status: Option<EnquiryStatus>,
}
