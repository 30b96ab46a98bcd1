//! Navigation menu store backed by a JSON file.
//!
//! The whole file is read on every call and rewritten on every change.
//! Writers in this process take a mutex so concurrent edits can't interleave
//! their read-modify-write; the new contents go to a sibling temp file which
//! is then renamed over the old one.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;

use taxpoint_core::FieldErrors;

use crate::models::{MenuItem, SubMenuItem};

/// Errors that can occur when reading or editing the menu.
#[derive(Debug, Error)]
pub enum MenuError {
    /// File could not be read or written.
    #[error("menu file I/O error: {0}")]
    Io(#[from] io::Error),

    /// File exists but is not a valid menu.
    #[error("menu file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Index outside the current menu.
    #[error("no menu item at index {0}")]
    NotFound(usize),

    /// Item failed validation.
    #[error("invalid menu item: {0}")]
    Invalid(FieldErrors),
}

/// File-backed menu store.
#[derive(Debug)]
pub struct MenuStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MenuStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the menu file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole menu. A missing file is an empty menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Io` or `MenuError::Corrupt` if the file can't be read.
    pub async fn load(&self) -> Result<Vec<MenuItem>, MenuError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append an item and return the new menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Invalid` if the item fails validation.
    pub async fn add(&self, item: MenuItem) -> Result<Vec<MenuItem>, MenuError> {
        validate_item(&item)?;
        let _guard = self.write_lock.lock().await;

        let mut menu = self.load().await?;
        menu.push(item);
        self.save(&menu).await?;
        Ok(menu)
    }

    /// Replace the item at `index` and return the new menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::NotFound` for an out-of-range index.
    pub async fn replace(&self, index: usize, item: MenuItem) -> Result<Vec<MenuItem>, MenuError> {
        validate_item(&item)?;
        let _guard = self.write_lock.lock().await;

        let mut menu = self.load().await?;
        let slot = menu.get_mut(index).ok_or(MenuError::NotFound(index))?;
        *slot = item;
        self.save(&menu).await?;
        Ok(menu)
    }

    /// Remove the item at `index` and return the new menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::NotFound` for an out-of-range index.
    pub async fn remove(&self, index: usize) -> Result<Vec<MenuItem>, MenuError> {
        let _guard = self.write_lock.lock().await;

        let mut menu = self.load().await?;
        if index >= menu.len() {
            return Err(MenuError::NotFound(index));
        }
        menu.remove(index);
        self.save(&menu).await?;
        Ok(menu)
    }

    /// Replace the whole menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Invalid` if any item fails validation.
    pub async fn replace_all(&self, menu: Vec<MenuItem>) -> Result<Vec<MenuItem>, MenuError> {
        for (index, item) in menu.iter().enumerate() {
            validate_item(item).map_err(|e| match e {
                MenuError::Invalid(errors) => MenuError::Invalid(prefix_errors(index, &errors)),
                other => other,
            })?;
        }
        let _guard = self.write_lock.lock().await;
        self.save(&menu).await?;
        Ok(menu)
    }

    async fn save(&self, menu: &[MenuItem]) -> Result<(), MenuError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut json = serde_json::to_vec_pretty(menu)?;
        json.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::info!(path = %self.path.display(), items = menu.len(), "Menu saved");
        Ok(())
    }
}

/// Title and href must be non-blank, at both levels.
fn validate_item(item: &MenuItem) -> Result<(), MenuError> {
    let mut errors = FieldErrors::new();
    check_link(&mut errors, "", &item.title, &item.href);
    for (i, sub) in item.submenu.iter().enumerate() {
        let SubMenuItem { title, href } = sub;
        check_link(&mut errors, &format!("submenu.{i}."), title, href);
    }
    errors.into_result().map_err(MenuError::Invalid)
}

fn check_link(errors: &mut FieldErrors, prefix: &str, title: &str, href: &str) {
    if title.trim().is_empty() {
        errors.add(format!("{prefix}title"), "title is required");
    }
    if href.trim().is_empty() {
        errors.add(format!("{prefix}href"), "href is required");
    }
}

fn prefix_errors(index: usize, errors: &FieldErrors) -> FieldErrors {
    let mut prefixed = FieldErrors::new();
    for (field, messages) in errors.iter() {
        for message in messages {
            prefixed.add(format!("{index}.{field}"), message.clone());
        }
    }
    prefixed
}
