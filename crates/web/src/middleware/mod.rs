//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans with `request_id`)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on form and auth routes (governor)
//!
//! Authentication is done by extractors rather than layers: [`RequireUser`],
//! [`OptionalUser`] and [`RequireAdmin`].

pub mod admin;
pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use admin::RequireAdmin;
pub use auth::{OptionalUser, RequireUser, clear_current_user, set_current_user};
pub use rate_limit::{auth_rate_limiter, form_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
