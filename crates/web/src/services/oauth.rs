//! Google OAuth 2.0 authorization-code client.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::GoogleOAuthConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Errors that can occur during the OAuth exchange.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a URL or response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Profile fields returned by the userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
}

impl GoogleOAuthClient {
    /// Create a new OAuth client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GoogleOAuthConfig) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// URL to send the browser to.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Parse` if the authorize URL cannot be built.
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| OAuthError::Parse(e.to_string()))?;

        Ok(url.into())
    }

    /// Exchange the authorization code and fetch the user's profile.
    ///
    /// # Errors
    ///
    /// Returns error if either request fails or returns a non-success status.
    #[instrument(skip_all)]
    pub async fn fetch_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;
        let token: TokenResponse = read_json(response).await?;

        let response = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, OAuthError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(OAuthError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| OAuthError::Parse(e.to_string()))
}

/// Generate a random CSRF state value.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..32)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}
