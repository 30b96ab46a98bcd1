//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::WebConfig;
use crate::services::admin_token::AdminTokenSigner;
use crate::services::email::{EmailError, EmailService};
use crate::services::intake::IntakeService;
use crate::services::menu::MenuStore;
use crate::services::oauth::{GoogleOAuthClient, OAuthError};
use crate::services::sheets::{SheetsClient, SheetsError};
use crate::services::storage::{StorageClient, StorageError};

/// Error building a client during startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("file storage client: {0}")]
    Storage(#[from] StorageError),
    #[error("spreadsheet client: {0}")]
    Sheets(#[from] SheetsError),
    #[error("email service: {0}")]
    Email(#[from] EmailError),
    #[error("google oauth client: {0}")]
    OAuth(#[from] OAuthError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: PgPool,
    storage: StorageClient,
    sheets: SheetsClient,
    email: EmailService,
    google: Option<GoogleOAuthClient>,
    tokens: AdminTokenSigner,
    menu: MenuStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if any external client fails to build.
    pub fn new(config: WebConfig, pool: PgPool) -> Result<Self, StateError> {
        let storage = StorageClient::new(&config.storage)?;
        let sheets = SheetsClient::new(&config.sheets)?;
        let email = EmailService::new(&config.email)?;
        let google = config
            .google
            .as_ref()
            .map(GoogleOAuthClient::new)
            .transpose()?;
        let tokens = AdminTokenSigner::new(config.admin.token_secret.clone());
        let menu = MenuStore::new(config.menu_file.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storage,
                sheets,
                email,
                google,
                tokens,
                menu,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Form pipelines wired to the live storage, spreadsheet and mail clients.
    #[must_use]
    pub fn intake(&self) -> IntakeService<'_> {
        IntakeService::new(&self.inner.storage, &self.inner.sheets, &self.inner.email)
    }

    /// Google sign-in client, if configured.
    #[must_use]
    pub fn google(&self) -> Option<&GoogleOAuthClient> {
        self.inner.google.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &AdminTokenSigner {
        &self.inner.tokens
    }

    #[must_use]
    pub fn menu(&self) -> &MenuStore {
        &self.inner.menu
    }
}
