//! Per-field validation errors.

use std::collections::BTreeMap;

use serde::Serialize;

/// Validation failures keyed by field name.
///
/// Serializes as a JSON object of `field -> [messages]`, which is what the
/// API returns in the `errors` member of a `422` response.
///
/// ```
/// use taxpoint_core::FieldErrors;
///
/// let mut errors = FieldErrors::new();
/// errors.add("email", "email must contain a single @ symbol");
/// assert!(errors.has("email"));
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an error set holding a single message.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the field has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Iterate over `(field, messages)` in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Move every message from `other` into this set.
    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns the error set itself when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_object() {
        let mut errors = FieldErrors::new();
        errors.add("name", "name is required");
        errors.add("name", "second");
        errors.add("email", "bad");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": ["bad"], "name": ["name is required", "second"]})
        );
    }

    #[test]
    fn test_display_joins_messages() {
        let errors = FieldErrors::single("phone", "too short");
        assert_eq!(errors.to_string(), "phone: too short");
        assert_eq!(errors.get("phone"), ["too short".to_string()]);
        assert!(errors.get("email").is_empty());
    }

    #[test]
    fn test_merge_appends() {
        let mut errors = FieldErrors::single("email", "bad");
        errors.merge(FieldErrors::single("email", "worse"));
        errors.merge(FieldErrors::single("phone", "missing"));
        assert_eq!(errors.get("email").len(), 2);
        assert_eq!(errors.iter().count(), 2);
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::single("x", "y").into_result().is_err());
    }
}
