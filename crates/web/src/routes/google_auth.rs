//! Google sign-in.
//!
//! Standard authorization-code flow with a random `state` kept in the
//! session. Both routes answer `404` when Google credentials aren't
//! configured.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::auth::sign_in;
use crate::error::AppError;
use crate::models::session::keys;
use crate::services::auth::{AuthError, AuthService};
use crate::services::oauth::{GoogleOAuthClient, generate_state};
use crate::state::AppState;

const CALLBACK_PATH: &str = "/auth/google/callback";

/// Query parameters from the Google callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn client(state: &AppState) -> Result<&GoogleOAuthClient, AppError> {
    state
        .google()
        .ok_or_else(|| AppError::NotFound("Google sign-in is not configured".to_string()))
}

/// Redirect to Google's consent screen.
///
/// # Route
///
/// `GET /auth/google/login`
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let google = client(&state)?;
    let oauth_state = generate_state();

    session
        .insert(keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let url = google.authorization_url(&state.config().url_for(CALLBACK_PATH), &oauth_state)?;
    Ok(Redirect::to(&url).into_response())
}

/// Finish Google sign-in and go to the home page.
///
/// # Route
///
/// `GET /auth/google/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    let google = client(&state)?;

    if let Some(error) = query.error {
        tracing::warn!(%error, "Google sign-in was denied");
        return Ok(Redirect::to("/?auth_error=denied").into_response());
    }

    let stored_state: Option<String> = session
        .remove(keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        tracing::warn!("Google callback missing code or state");
        return Ok(Redirect::to("/?auth_error=invalid_request").into_response());
    };

    if stored_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!("Google OAuth state mismatch");
        return Ok(Redirect::to("/?auth_error=invalid_state").into_response());
    }

    let profile = match google
        .fetch_profile(&code, &state.config().url_for(CALLBACK_PATH))
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(error = %e, "Google token exchange failed");
            return Ok(Redirect::to("/?auth_error=provider").into_response());
        }
    };

    let user = match AuthService::new(state.pool())
        .sign_in_with_google(&profile)
        .await
    {
        Ok(user) => user,
        Err(AuthError::UnverifiedEmail) => {
            tracing::warn!("Google account email is not verified");
            return Ok(Redirect::to("/?auth_error=unverified_email").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    sign_in(&session, &user).await?;
    Ok(Redirect::to("/").into_response())
}
