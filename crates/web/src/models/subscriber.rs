//! Subscriber domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use taxpoint_core::{Email, Phone, SubscriberId};

/// A newsletter subscriber.
///
/// At least one of `email` and `phone` is always present; the table carries
/// a check constraint and the record service refuses edits that clear both.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
    pub subscribed_at: DateTime<Utc>,
}

/// Data for inserting a subscriber.
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub email: Option<Email>,
    pub phone: Option<Phone>,
}

/// Admin edit of a subscriber.
///
/// The outer `Option` says whether the field was sent; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::option_option)]
pub struct SubscriberPatch {
    pub email: Option<Option<Email>>,
    pub phone: Option<Option<Phone>>,
}

impl SubscriberPatch {
    /// Whether applying this patch to `current` leaves a way to reach the subscriber.
    #[must_use]
    pub fn keeps_contact(&self, current: &Subscriber) -> bool {
        let email = self.email.as_ref().map_or(current.email.is_some(), Option::is_some);
        let phone = self.phone.as_ref().map_or(current.phone.is_some(), Option::is_some);
        email || phone
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn subscriber(email: Option<&str>, phone: Option<&str>) -> Subscriber {
        Subscriber {
            id: SubscriberId::new(1),
            email: email.map(|e| Email::parse(e).unwrap()),
            phone: phone.map(|p| Phone::parse(p).unwrap()),
            subscribed_at: Utc::now(),
        }
    }

    #[test]
    fn test_clearing_only_contact_is_refused() {
        let current = subscriber(Some("a@b.com"), None);
        let patch = SubscriberPatch {
            email: Some(None),
            phone: None,
        };
        assert!(!patch.keeps_contact(&current));
    }

    #[test]
    fn test_clearing_one_of_two_is_allowed() {
        let current = subscriber(Some("a@b.com"), Some("5551234567"));
        let patch = SubscriberPatch {
            email: Some(None),
            phone: None,
        };
        assert!(patch.keeps_contact(&current));
    }

    #[test]
    fn test_swapping_contact_is_allowed() {
        let current = subscriber(Some("a@b.com"), None);
        let patch = SubscriberPatch {
            email: Some(None),
            phone: Some(Some(Phone::parse("5551234567").unwrap())),
        };
        assert!(patch.keeps_contact(&current));
        assert!(SubscriberPatch::default().keeps_contact(&current));
    }
}
