//! Contact form endpoint.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::extract::JsonOrForm;
use crate::db::ContactRepository;
use crate::error::AppError;
use crate::models::ContactMessage;
use crate::services::intake::ContactSubmission;
use crate::state::AppState;

/// Accept a contact message as JSON or a urlencoded form.
///
/// # Route
///
/// `POST /api/contact`
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    JsonOrForm(form): JsonOrForm<ContactSubmission>,
) -> Result<(StatusCode, Json<ContactMessage>), AppError> {
    let message = state
        .intake()
        .submit_contact(&ContactRepository::new(state.pool()), &form)
        .await
        .map_err(|e| AppError::intake("Failed to send message", e))?;

    Ok((StatusCode::CREATED, Json(message)))
}
