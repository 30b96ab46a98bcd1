//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Readiness (database)
//!
//! # Public forms (rate limited)
//! POST   /api/enquiries                  - Multipart enquiry with attachments
//! POST   /api/contact                    - Contact message
//! POST   /api/subscribe                  - Newsletter subscription
//! GET    /api/menu                       - Navigation menu
//!
//! # Auth
//! POST   /auth/register                  - Create account
//! POST   /auth/login                     - Sign in
//! POST   /auth/logout                    - Sign out
//! GET    /auth/me                        - Current user
//! GET    /auth/google/login              - Redirect to Google
//! GET    /auth/google/callback           - Google OAuth callback
//!
//! # Admin (bearer token)
//! POST   /api/admin/auth/sign-in         - Issue admin token
//! GET    /api/admin/records/{kind}       - List records
//! GET    /api/admin/records/{kind}/{id}  - Show record
//! PATCH  /api/admin/records/{kind}/{id}  - Edit record
//! DELETE /api/admin/records/{kind}/{id}  - Delete record
//! GET    /api/admin/menu                 - Menu
//! POST   /api/admin/menu                 - Append menu item
//! PUT    /api/admin/menu/{index}         - Replace menu item
//! DELETE /api/admin/menu/{index}         - Remove menu item
//! ```

pub mod admin;
pub mod auth;
pub mod contact;
pub mod enquiries;
pub mod extract;
pub mod google_auth;
pub mod menu;
pub mod subscribe;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, form_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::services::intake::MAX_ENQUIRY_BODY_BYTES;
use crate::state::AppState;

/// Public form endpoints.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/enquiries",
            post(enquiries::submit).layer(DefaultBodyLimit::max(MAX_ENQUIRY_BODY_BYTES)),
        )
        .route("/contact", post(contact::submit))
        .route("/subscribe", post(subscribe::subscribe))
        .layer(form_rate_limiter())
}

/// End-user auth endpoints.
pub fn auth_routes() -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(credentials)
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/google/login", get(google_auth::login))
        .route("/google/callback", get(google_auth::callback))
}

/// Admin API endpoints.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/sign-in",
            post(admin::auth::sign_in).layer(auth_rate_limiter()),
        )
        .route("/records/{kind}", get(admin::records::list))
        .route(
            "/records/{kind}/{id}",
            get(admin::records::show)
                .patch(admin::records::update)
                .delete(admin::records::delete),
        )
        .route("/menu", get(admin::menu::list).post(admin::menu::add))
        .route(
            "/menu/{index}",
            axum::routing::put(admin::menu::replace).delete(admin::menu::remove),
        )
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/menu", get(menu::show))
        .nest("/api", form_routes())
        .nest("/api/admin", admin_routes())
        .nest("/auth", auth_routes())
}

/// Build the full application with its middleware stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    routes()
        .layer(session_layer)
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::test_config;

    /// App over a pool that never connects. Only routes that fail before
    /// touching the database can be exercised.
    fn test_app(menu_dir: &tempfile::TempDir) -> Router {
        let mut config = test_config();
        config.menu_file = menu_dir.path().join("menu.json");
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/taxpoint_test")
            .unwrap();
        app(AppState::new(config, pool).unwrap())
    }

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.5")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(request("GET", "/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_subscribe_without_contact_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                request("POST", "/api/subscribe")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["message"],
            "an email address or phone number is required"
        );
    }

    #[tokio::test]
    async fn test_invalid_contact_lists_fields() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                request("POST", "/api/contact")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("name=Ravi&email=nope"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["message"].is_array());
    }

    #[tokio::test]
    async fn test_enquiry_needs_multipart_body() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                request("POST", "/api/enquiries")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"full_name":"Ravi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = json_body(response).await;
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(&dir);

        let response = app
            .clone()
            .oneshot(
                request("GET", "/api/admin/records/invoices")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                request("DELETE", "/api/admin/menu/0")
                    .header(AUTHORIZATION, "Bearer forged.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_menu_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join("menu.json"),
            r#"[{"title":"Services","href":"/services","subMenu":[{"title":"GST","href":"/gst"}]}]"#,
        )
        .await
        .unwrap();

        let response = test_app(&dir)
            .oneshot(request("GET", "/api/menu").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["submenu"][0]["title"], "GST");
    }

    #[tokio::test]
    async fn test_google_routes_absent_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                request("GET", "/auth/google/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
