//! Integration tests for Taxpoint.
//!
//! These tests drive a running server over HTTP. They are `#[ignore]`d so a
//! plain `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p taxpoint-cli -- migrate
//! cargo run -p taxpoint-web &
//! cargo test -p taxpoint-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `TAXPOINT_TEST_URL` - Server under test (default: `http://localhost:3000`)
//! - `TAXPOINT_TEST_ADMIN_EMAIL`, `TAXPOINT_TEST_ADMIN_PASSWORD`, `ADMIN_KEY` -
//!   An admin created with `tp-cli admin create`, for the admin API tests

use reqwest::Client;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("TAXPOINT_TEST_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Absolute URL for a path on the server under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client with its own cookie jar.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no earlier run will have used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@taxpoint.test", uuid::Uuid::new_v4().simple())
}

/// Admin credentials from the environment, if configured.
#[must_use]
pub fn admin_credentials() -> Option<(String, String, String)> {
    let email = std::env::var("TAXPOINT_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("TAXPOINT_TEST_ADMIN_PASSWORD").ok()?;
    let admin_key = std::env::var("ADMIN_KEY").ok()?;
    Some((email, password, admin_key))
}
