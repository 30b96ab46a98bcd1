//! External file storage client.
//!
//! Uploads enquiry attachments with an unsigned multipart upload and returns
//! the public URL plus the storage-assigned id.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::StorageConfig;
use crate::models::StoredFile;

/// Errors that can occur when uploading a file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A file received from a form, not yet uploaded.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Somewhere to put uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Upload one file and return its stored reference.
    async fn upload(&self, attachment: &Attachment) -> Result<StoredFile, StorageError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// HTTP client for the file storage upload endpoint.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
    folder: String,
}

impl StorageClient {
    /// Create a new storage client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            upload_preset: config.upload_preset.clone(),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait]
impl FileStorage for StorageClient {
    #[instrument(
        skip_all,
        fields(file_name = %attachment.file_name, size = attachment.bytes.len())
    )]
    async fn upload(&self, attachment: &Attachment) -> Result<StoredFile, StorageError> {
        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| StorageError::Parse(format!("invalid content type: {e}")))?;

        let form = Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;

        tracing::debug!(storage_id = %uploaded.public_id, "Attachment uploaded");

        Ok(StoredFile {
            url: uploaded.secure_url,
            storage_id: uploaded.public_id,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_parses() {
        let json = r#"{"secure_url":"https://cdn.test/a.pdf","public_id":"enquiries/a","bytes":123}"#;
        let parsed: UploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.secure_url, "https://cdn.test/a.pdf");
        assert_eq!(parsed.public_id, "enquiries/a");
    }
}
