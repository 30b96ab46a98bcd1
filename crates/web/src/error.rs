//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has a JSON body:
//!
//! ```json
//! { "message": "...", "errors": { "field": ["..."] }, "error": "..." }
//! ```
//!
//! `errors` is present for validation failures and `error` names the failed
//! step of a form pipeline.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use taxpoint_core::FieldErrors;

use crate::db::RepositoryError;
use crate::services::admin_token::TokenError;
use crate::services::auth::AuthError;
use crate::services::intake::IntakeError;
use crate::services::menu::MenuError;
use crate::services::oauth::OAuthError;
use crate::services::records::RecordError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// A form pipeline failed. `context` is the client-facing summary.
    #[error("{context}: {source}")]
    Intake {
        context: &'static str,
        source: IntakeError,
    },

    /// Admin record operation failed.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Menu operation failed.
    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),

    /// Admin token rejected.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// OAuth provider exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a pipeline error with the summary shown to the client.
    #[must_use]
    pub const fn intake(context: &'static str, source: IntakeError) -> Self {
        Self::Intake { context, source }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UnverifiedEmail => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::MissingName
                | AuthError::WeakPassword(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Intake { source, .. } => match source {
                IntakeError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                IntakeError::MissingContact => StatusCode::BAD_REQUEST,
                IntakeError::AlreadySubscribed => StatusCode::CONFLICT,
                IntakeError::Upload(_)
                | IntakeError::Persist(_)
                | IntakeError::Spreadsheet(_)
                | IntakeError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Record(err) => match err {
                RecordError::UnknownKind(_) => StatusCode::BAD_REQUEST,
                RecordError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
                RecordError::LastAdmin | RecordError::Conflict(_) => StatusCode::CONFLICT,
                RecordError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Menu(err) => match err {
                MenuError::NotFound(_) => StatusCode::NOT_FOUND,
                MenuError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                MenuError::Io(_) | MenuError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Token(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::OAuth(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            // Don't expose internal error details to clients
            Self::Database(RepositoryError::Conflict(message))
            | Self::Record(RecordError::Conflict(message))
            | Self::Conflict(message) => ErrorBody::message(message.clone()),
            Self::Database(RepositoryError::NotFound) => ErrorBody::message("Not found"),
            Self::Database(_) | Self::Internal(_) => ErrorBody::message("Internal server error"),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => ErrorBody::message("Invalid credentials"),
                AuthError::UnverifiedEmail => {
                    ErrorBody::message("Your Google account email is not verified")
                }
                AuthError::UserAlreadyExists => {
                    ErrorBody::message("An account with this email already exists")
                }
                AuthError::InvalidEmail(e) => {
                    ErrorBody::invalid(FieldErrors::single("email", e.to_string()))
                }
                AuthError::MissingName => {
                    ErrorBody::invalid(FieldErrors::single("name", "name is required"))
                }
                AuthError::WeakPassword(msg) => {
                    ErrorBody::invalid(FieldErrors::single("password", msg.clone()))
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    ErrorBody::message("Authentication error")
                }
            },
            Self::Intake { context, source } => match source {
                IntakeError::Invalid(errors) => ErrorBody::invalid(errors.clone()),
                IntakeError::MissingContact | IntakeError::AlreadySubscribed => {
                    ErrorBody::message(source.to_string())
                }
                _ => ErrorBody {
                    message: (*context).to_string(),
                    errors: None,
                    error: source.failed_step().map(str::to_string),
                },
            },
            Self::Record(err) => match err {
                RecordError::Invalid(errors) => ErrorBody::invalid(errors.clone()),
                RecordError::Repository(_) => ErrorBody::message("Internal server error"),
                _ => ErrorBody::message(err.to_string()),
            },
            Self::Menu(err) => match err {
                MenuError::Invalid(errors) => ErrorBody::invalid(errors.clone()),
                MenuError::NotFound(_) => ErrorBody::message(err.to_string()),
                MenuError::Io(_) | MenuError::Corrupt(_) => {
                    ErrorBody::message("Menu is unavailable")
                }
            },
            Self::Token(_) => ErrorBody::message("Invalid or expired token"),
            Self::OAuth(_) => ErrorBody::message("Sign-in provider error"),
            Self::Validation(errors) => ErrorBody::invalid(errors.clone()),
            Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::BadRequest(message)
            | Self::PayloadTooLarge(message) => ErrorBody::message(message.clone()),
            Self::RateLimited => ErrorBody::message("Too many requests"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
            error: None,
        }
    }

    fn invalid(errors: FieldErrors) -> Self {
        Self {
            message: "Validation failed".to_string(),
            errors: Some(errors),
            error: None,
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
