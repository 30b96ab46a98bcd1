//! Public menu endpoint.

use axum::{Json, extract::State};

use crate::error::AppError;
use crate::models::MenuItem;
use crate::state::AppState;

/// The whole navigation menu.
///
/// # Route
///
/// `GET /api/menu`
pub async fn show(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>, AppError> {
    Ok(Json(state.menu().load().await?))
}
