//! Record kinds exposed by the generic admin record endpoint.

use serde::{Deserialize, Serialize};

/// Error returned when a path segment does not name a known record kind.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown record type: {0}")]
pub struct UnknownRecordKind(pub String);

/// The fixed set of record types the admin dashboard can list, edit and delete.
///
/// Parsed from the `{kind}` path segment. Plural names are canonical; the
/// singular forms are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Enquiries,
    Contacts,
    Subscribers,
    Users,
}

impl RecordKind {
    /// Every record kind, in dashboard order.
    pub const ALL: [Self; 4] = [Self::Enquiries, Self::Contacts, Self::Subscribers, Self::Users];

    /// Canonical path segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enquiries => "enquiries",
            Self::Contacts => "contacts",
            Self::Subscribers => "subscribers",
            Self::Users => "users",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enquiries" | "enquiry" => Ok(Self::Enquiries),
            "contacts" | "contact" => Ok(Self::Contacts),
            "subscribers" | "subscriber" => Ok(Self::Subscribers),
            "users" | "user" => Ok(Self::Users),
            other => Err(UnknownRecordKind(other.to_owned())),
        }
    }
}
