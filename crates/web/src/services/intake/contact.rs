//! Contact form pipeline.

use serde::Deserialize;
use tracing::instrument;

use taxpoint_core::FieldErrors;

use super::{ContactStore, IntakeError, IntakeService, required_email, required_text};
use crate::models::{ContactMessage, NewContactMessage};

const MAX_NAME_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5_000;

/// Contact form body. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl IntakeService<'_> {
    /// Validate, save and forward a contact message to the team.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Invalid` for missing or malformed fields,
    /// otherwise the error of the first failing step.
    #[instrument(skip_all)]
    pub async fn submit_contact(
        &self,
        store: &dyn ContactStore,
        submission: &ContactSubmission,
    ) -> Result<ContactMessage, IntakeError> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", &submission.name, MAX_NAME_CHARS);
        let email = required_email(&mut errors, "email", &submission.email);
        let message = required_text(&mut errors, "message", &submission.message, MAX_MESSAGE_CHARS);

        let Some(email) = email else {
            return Err(IntakeError::Invalid(errors));
        };
        errors.into_result().map_err(IntakeError::Invalid)?;

        let saved = store
            .insert_contact(&NewContactMessage {
                name,
                email,
                message,
            })
            .await?;

        self.notifier.new_contact_message(&saved).await?;

        tracing::info!(contact_id = %saved.id, "Contact message received");
        Ok(saved)
    }
}
