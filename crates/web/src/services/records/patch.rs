//! Per-kind validation of partial admin edits.
//!
//! A patch body is a JSON object. Immutable fields are dropped first, every
//! remaining field must belong to the kind's schema, and each value is
//! validated on its own so the response can report every bad field at once.

use std::fmt::Display;
use std::str::FromStr;

use serde_json::{Map, Value};

use taxpoint_core::{Email, EnquiryStatus, FieldErrors, Phone, RecordKind, UserRole};

use crate::models::{ContactPatch, EnquiryPatch, RecordPatch, SubscriberPatch, UserPatch};

/// Dropped from every patch.
const IMMUTABLE: &[&str] = &["id", "created_at", "updated_at", "subscribed_at"];

/// Additionally dropped from user patches. Account identity and credentials
/// only change through the auth flows.
const USER_IMMUTABLE: &[&str] = &["email", "password", "password_hash", "provider"];

/// Validate a JSON patch body against the schema for `kind`.
///
/// # Errors
///
/// Returns every field that is unknown or holds an invalid value.
pub fn parse_patch(kind: RecordKind, body: &Value) -> Result<RecordPatch, FieldErrors> {
    let Value::Object(fields) = body else {
        return Err(FieldErrors::single("body", "expected a JSON object"));
    };

    let mut fields = fields.clone();
    for name in IMMUTABLE {
        fields.remove(*name);
    }
    if kind == RecordKind::Users {
        for name in USER_IMMUTABLE {
            fields.remove(*name);
        }
    }

    let mut reader = FieldReader::new(fields);
    let patch = match kind {
        RecordKind::Enquiries => RecordPatch::Enquiry(EnquiryPatch {
            full_name: reader.text("full_name"),
            email: reader.parsed::<Email>("email"),
            query: reader.text("query"),
            status: reader.parsed::<EnquiryStatus>("status"),
        }),
        RecordKind::Contacts => RecordPatch::Contact(ContactPatch {
            name: reader.text("name"),
            email: reader.parsed::<Email>("email"),
            message: reader.text("message"),
        }),
        RecordKind::Subscribers => RecordPatch::Subscriber(SubscriberPatch {
            email: reader.nullable::<Email>("email"),
            phone: reader.nullable::<Phone>("phone"),
        }),
        RecordKind::Users => RecordPatch::User(UserPatch {
            name: reader.text("name"),
            image: reader.nullable_text("image"),
            role: reader.parsed::<UserRole>("role"),
        }),
    };

    reader.finish()?;
    Ok(patch)
}

/// Takes fields out of a JSON object, collecting errors as it goes.
struct FieldReader {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl FieldReader {
    fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            errors: FieldErrors::new(),
        }
    }

    /// A non-blank string, trimmed.
    fn text(&mut self, field: &str) -> Option<String> {
        match self.fields.remove(field)? {
            Value::String(s) if s.trim().is_empty() => {
                self.errors.add(field, format!("{field} cannot be empty"));
                None
            }
            Value::String(s) => Some(s.trim().to_string()),
            _ => {
                self.errors.add(field, format!("{field} must be a string"));
                None
            }
        }
    }

    /// A string or null. Blank strings clear the field.
    #[allow(clippy::option_option)]
    fn nullable_text(&mut self, field: &str) -> Option<Option<String>> {
        match self.fields.remove(field)? {
            Value::Null => Some(None),
            Value::String(s) if s.trim().is_empty() => Some(None),
            Value::String(s) => Some(Some(s.trim().to_string())),
            _ => {
                self.errors
                    .add(field, format!("{field} must be a string or null"));
                None
            }
        }
    }

    /// A non-blank string parsed into `T`.
    fn parsed<T>(&mut self, field: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.text(field)?;
        self.parse_value(field, &raw)
    }

    /// Like [`Self::parsed`], but null or blank clears the field.
    #[allow(clippy::option_option)]
    fn nullable<T>(&mut self, field: &str) -> Option<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.nullable_text(field)? {
            None => Some(None),
            Some(raw) => self.parse_value(field, &raw).map(Some),
        }
    }

    fn parse_value<T>(&mut self, field: &str, raw: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.add(field, e.to_string());
                None
            }
        }
    }

    /// Whatever is left over was not in the schema.
    fn finish(mut self) -> Result<(), FieldErrors> {
        for field in self.fields.keys() {
            self.errors.add(field.clone(), "unknown field");
        }
        self.errors.into_result()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_patch_drops_identity_fields() {
        let patch = parse_patch(
            RecordKind::Users,
            &json!({
                "id": 99,
                "email": "attacker@example.com",
                "password": "hunter22",
                "provider": "google",
                "name": "  Meera  ",
                "role": "admin"
            }),
        )
        .unwrap();

        assert_eq!(
            patch,
            RecordPatch::User(UserPatch {
                name: Some("Meera".to_string()),
                image: None,
                role: Some(UserRole::Admin),
            })
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let errors = parse_patch(
            RecordKind::Contacts,
            &json!({"name": "A", "is_spam": true}),
        )
        .unwrap_err();
        assert_eq!(errors.get("is_spam"), ["unknown field".to_string()]);
        assert!(!errors.has("name"));
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let errors = parse_patch(
            RecordKind::Enquiries,
            &json!({"full_name": "", "email": "nope", "query": 4, "status": "closed"}),
        )
        .unwrap_err();

        for field in ["full_name", "email", "query", "status"] {
            assert!(errors.has(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_subscriber_fields_are_nullable() {
        let patch = parse_patch(
            RecordKind::Subscribers,
            &json!({"email": null, "phone": "+91 98765 43210", "subscribed_at": "2020-01-01"}),
        )
        .unwrap();

        assert_eq!(
            patch,
            RecordPatch::Subscriber(SubscriberPatch {
                email: Some(None),
                phone: Some(Some(Phone::parse("+919876543210").unwrap())),
            })
        );
    }

    #[test]
    fn test_empty_after_stripping() {
        let patch = parse_patch(
            RecordKind::Enquiries,
            &json!({"id": 1, "created_at": "2024-04-01T00:00:00Z"}),
        )
        .unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_body_must_be_an_object() {
        let errors = parse_patch(RecordKind::Users, &json!(["name"])).unwrap_err();
        assert!(errors.has("body"));
    }
}
