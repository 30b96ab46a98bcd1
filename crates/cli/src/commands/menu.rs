//! Navigation menu seeding.
//!
//! ```bash
//! tp-cli menu seed data/menu.seed.json
//! ```
//!
//! The target file is `MENU_FILE` (default `data/menu.json`), the same file
//! the web server serves.

use std::path::Path;

use taxpoint_web::models::MenuItem;
use taxpoint_web::services::menu::{MenuError, MenuStore};
use thiserror::Error;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seed file is not a valid menu: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Menu(#[from] MenuError),
}

/// Replace the menu with the contents of `file`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or the menu cannot
/// be written.
pub async fn seed(file: &str) -> Result<usize, SeedError> {
    dotenvy::dotenv().ok();
    let target = std::env::var("MENU_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "data/menu.json".to_owned());

    seed_into(Path::new(file), &MenuStore::new(target)).await
}

async fn seed_into(file: &Path, store: &MenuStore) -> Result<usize, SeedError> {
    if !file.exists() {
        return Err(SeedError::NotFound(file.display().to_string()));
    }

    tracing::info!(path = %file.display(), "Loading menu from file");
    let content = tokio::fs::read(file).await?;
    let items: Vec<MenuItem> = serde_json::from_slice(&content)?;

    let saved = store.replace_all(items).await?;
    tracing::info!(
        items = saved.len(),
        target = %store.path().display(),
        "Menu seeded"
    );
    Ok(saved.len())
}
