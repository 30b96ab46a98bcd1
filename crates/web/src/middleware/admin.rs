//! Admin API authorization.
//!
//! Admin routes accept `Authorization: Bearer <token>` issued by the admin
//! sign-in endpoint. A signed-in session user with the admin role is accepted
//! as a fallback. Either way the user is reloaded so a demoted or deleted
//! admin loses access immediately.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;

use taxpoint_core::UserId;

use super::OptionalUser;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires an admin. `401` without valid credentials, `403`
/// for a valid user who is not an admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = match bearer_token(parts) {
            Some(token) => state.tokens().verify(token, Utc::now())?.sub,
            None => session_user_id(parts, state).await?,
        };

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted admin access");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        crate::error::set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

async fn session_user_id(parts: &mut Parts, state: &AppState) -> Result<UserId, AppError> {
    let OptionalUser(user) = OptionalUser::from_request_parts(parts, state)
        .await
        .unwrap_or(OptionalUser(None));

    user.map(|u| u.id)
        .ok_or_else(|| AppError::Unauthorized("Admin token required".to_string()))
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/admin/menu");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
