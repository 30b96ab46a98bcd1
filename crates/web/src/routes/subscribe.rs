//! Newsletter subscription endpoint.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::extract::JsonOrForm;
use crate::db::SubscriberRepository;
use crate::error::AppError;
use crate::models::Subscriber;
use crate::services::intake::SubscriptionRequest;
use crate::state::AppState;

/// Subscribe an email address and/or phone number.
///
/// # Route
///
/// `POST /api/subscribe`
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<SubscriptionRequest>,
) -> Result<(StatusCode, Json<Subscriber>), AppError> {
    let subscriber = state
        .intake()
        .subscribe(&SubscriberRepository::new(state.pool()), &request)
        .await
        .map_err(|e| AppError::intake("Failed to subscribe", e))?;

    Ok((StatusCode::CREATED, Json(subscriber)))
}
