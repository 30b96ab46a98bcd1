//! Admin sign-in.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::models::User;
use crate::routes::extract::JsonOrForm;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Admin sign-in form.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub admin_key: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Exchange credentials plus the admin key for a bearer token.
///
/// # Route
///
/// `POST /api/admin/auth/sign-in`
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    JsonOrForm(form): JsonOrForm<SignInForm>,
) -> Result<Json<SignInResponse>, AppError> {
    let user = AuthService::new(state.pool())
        .admin_sign_in(
            &form.email,
            &form.password,
            &form.admin_key,
            &state.config().admin.admin_key,
        )
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Admin sign-in rejected"))?;

    let issued = state
        .tokens()
        .issue(&user, Utc::now())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "Admin signed in");
    Ok(Json(SignInResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}
