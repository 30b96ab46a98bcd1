//! End-user authentication endpoints.
//!
//! Credentials accounts register and log in here; the signed-in user lives in
//! the session.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::extract::JsonOrForm;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireUser, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Create a credentials account and sign it in.
///
/// # Route
///
/// `POST /auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    JsonOrForm(form): JsonOrForm<RegisterForm>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password)
        .await?;

    sign_in(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
///
/// # Route
///
/// `POST /auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonOrForm(form): JsonOrForm<LoginForm>,
) -> Result<Json<User>, AppError> {
    let user = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;

    sign_in(&session, &user).await?;
    Ok(Json(user))
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user.
///
/// # Route
///
/// `GET /auth/me`
pub async fn me(RequireUser(user): RequireUser) -> Json<CurrentUser> {
    Json(user)
}

/// Put `user` into the session.
pub(crate) async fn sign_in(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User signed in");
    Ok(())
}
