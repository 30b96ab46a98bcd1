//! Subcommand implementations.

pub mod admin;
pub mod menu;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Read the database URL from `TAXPOINT_DATABASE_URL`, falling back to
/// `DATABASE_URL`, and connect.
///
/// # Errors
///
/// Returns `sqlx::Error::Configuration` if neither variable is set, or the
/// connection error.
pub async fn connect() -> Result<PgPool, sqlx::Error> {
    dotenvy::dotenv().ok();

    let url = ["TAXPOINT_DATABASE_URL", "DATABASE_URL"]
        .into_iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
        .ok_or_else(|| {
            sqlx::Error::Configuration("TAXPOINT_DATABASE_URL or DATABASE_URL must be set".into())
        })?;

    tracing::info!("Connecting to database...");
    taxpoint_web::db::create_pool(&url).await
}
