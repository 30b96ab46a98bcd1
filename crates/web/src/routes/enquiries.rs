//! Enquiry submission endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::db::EnquiryRepository;
use crate::error::AppError;
use crate::models::Enquiry;
use crate::routes::extract::ApiMultipart;
use crate::services::intake::EnquirySubmission;
use crate::services::storage::Attachment;
use crate::state::AppState;

/// Accept a multipart enquiry.
///
/// # Route
///
/// `POST /api/enquiries`
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    ApiMultipart(mut multipart): ApiMultipart,
) -> Result<(StatusCode, Json<Enquiry>), AppError> {
    let submission = read_submission(&mut multipart).await?;

    let enquiry = state
        .intake()
        .submit_enquiry(&EnquiryRepository::new(state.pool()), submission)
        .await
        .map_err(|e| AppError::intake("Failed to submit enquiry", e))?;

    Ok((StatusCode::CREATED, Json(enquiry)))
}

async fn read_submission(multipart: &mut Multipart) -> Result<EnquirySubmission, AppError> {
    let mut submission = EnquirySubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "full_name" | "fullName" | "name" => {
                submission.full_name = field.text().await?;
            }
            "email" => submission.email = field.text().await?,
            "query" => submission.query = field.text().await?,
            "files" | "files[]" | "attachments" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;

                // Browsers send an empty unnamed part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                submission.attachments.push(Attachment {
                    file_name: if file_name.is_empty() {
                        "attachment".to_string()
                    } else {
                        file_name
                    },
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => tracing::debug!(field = other, "Ignoring unknown enquiry field"),
        }
    }

    Ok(submission)
}
