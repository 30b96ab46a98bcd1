//! Spreadsheet append client.
//!
//! Every enquiry and subscriber is mirrored as one row in a shared
//! spreadsheet. Rows are appended with `valueInputOption=USER_ENTERED` so
//! timestamps render as dates.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::SheetsConfig;

/// Errors that can occur when appending a row.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be configured.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Which tab a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetTab {
    Enquiries,
    Subscribers,
}

/// Appends rows to a spreadsheet.
#[async_trait]
pub trait SheetAppender: Send + Sync {
    /// Append one row of cell values to the given tab.
    async fn append_row(&self, tab: SheetTab, row: Vec<String>) -> Result<(), SheetsError>;
}

/// HTTP client for the spreadsheet values API.
#[derive(Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    enquiry_tab: String,
    subscriber_tab: String,
}

impl SheetsClient {
    /// Create a new spreadsheet client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SheetsConfig) -> Result<Self, SheetsError> {
        let mut headers = HeaderMap::new();
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", config.access_token.expose_secret()))
                .map_err(|e| SheetsError::Parse(format!("Invalid access token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            enquiry_tab: config.enquiry_tab.clone(),
            subscriber_tab: config.subscriber_tab.clone(),
        })
    }

    fn tab_name(&self, tab: SheetTab) -> &str {
        match tab {
            SheetTab::Enquiries => &self.enquiry_tab,
            SheetTab::Subscribers => &self.subscriber_tab,
        }
    }

    /// Full append URL for a tab.
    fn append_url(&self, tab: SheetTab) -> String {
        let range = format!("{}!A1", self.tab_name(tab));
        format!(
            "{}/v4/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.api_base,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&range)
        )
    }
}

#[async_trait]
impl SheetAppender for SheetsClient {
    #[instrument(skip(self, row))]
    async fn append_row(&self, tab: SheetTab, row: Vec<String>) -> Result<(), SheetsError> {
        let body = serde_json::json!({ "values": [row] });

        let response = self
            .client
            .post(self.append_url(tab))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> SheetsClient {
        SheetsClient::new(&SheetsConfig {
            api_base: "https://sheets.test.invalid/".to_string(),
            spreadsheet_id: "abc123".to_string(),
            access_token: SecretString::from("token"),
            enquiry_tab: "Enquiries".to_string(),
            subscriber_tab: "Mailing List".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_append_url_encodes_range() {
        let client = client();
        assert_eq!(
            client.append_url(SheetTab::Enquiries),
            "https://sheets.test.invalid/v4/spreadsheets/abc123/values/Enquiries%21A1:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS"
        );
        assert!(
            client
                .append_url(SheetTab::Subscribers)
                .contains("/values/Mailing%20List%21A1:append")
        );
    }
}
