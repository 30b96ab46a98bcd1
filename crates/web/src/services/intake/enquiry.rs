//! Enquiry submission pipeline.

use futures::future::try_join_all;
use tracing::instrument;

use taxpoint_core::FieldErrors;

use super::{EnquiryStore, IntakeError, IntakeService, required_email, required_text};
use crate::models::{Enquiry, NewEnquiry};
use crate::services::sheets::SheetTab;
use crate::services::storage::Attachment;

/// Most files one enquiry may carry.
pub const MAX_ATTACHMENTS: usize = 10;

/// Request body cap for the multipart enquiry endpoint.
pub const MAX_ENQUIRY_BODY_BYTES: usize = 25 * 1024 * 1024;

const MAX_NAME_CHARS: usize = 200;
const MAX_QUERY_CHARS: usize = 10_000;

/// Raw enquiry form contents.
#[derive(Debug, Clone, Default)]
pub struct EnquirySubmission {
    pub full_name: String,
    pub email: String,
    pub query: String,
    pub attachments: Vec<Attachment>,
}

impl IntakeService<'_> {
    /// Validate, upload attachments, save, append a spreadsheet row and
    /// send the confirmation email.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::Invalid` before any side effect if the form is
    /// invalid; otherwise the error of the first step that failed.
    #[instrument(skip_all, fields(attachments = submission.attachments.len()))]
    pub async fn submit_enquiry(
        &self,
        store: &dyn EnquiryStore,
        submission: EnquirySubmission,
    ) -> Result<Enquiry, IntakeError> {
        let mut errors = FieldErrors::new();
        let full_name = required_text(
            &mut errors,
            "full_name",
            &submission.full_name,
            MAX_NAME_CHARS,
        );
        let email = required_email(&mut errors, "email", &submission.email);
        let query = required_text(&mut errors, "query", &submission.query, MAX_QUERY_CHARS);
        check_attachments(&mut errors, &submission.attachments);

        let Some(email) = email else {
            return Err(IntakeError::Invalid(errors));
        };
        errors.into_result().map_err(IntakeError::Invalid)?;

        let files = try_join_all(
            submission
                .attachments
                .iter()
                .map(|attachment| self.storage.upload(attachment)),
        )
        .await?;

        let enquiry = store
            .insert_enquiry(&NewEnquiry {
                full_name,
                email,
                query,
                files,
            })
            .await?;

        self.sheets
            .append_row(SheetTab::Enquiries, spreadsheet_row(&enquiry))
            .await?;

        self.notifier.enquiry_received(&enquiry).await?;

        tracing::info!(enquiry_id = %enquiry.id, files = enquiry.files.len(), "Enquiry submitted");
        Ok(enquiry)
    }
}

fn check_attachments(errors: &mut FieldErrors, attachments: &[Attachment]) {
    if attachments.len() > MAX_ATTACHMENTS {
        errors.add(
            "files",
            format!("at most {MAX_ATTACHMENTS} files can be attached"),
        );
    }
    for attachment in attachments.iter().filter(|a| a.bytes.is_empty()) {
        errors.add("files", format!("{} is empty", attachment.file_name));
    }
}

/// `[created_at, full name, email, query, file urls, status]`
fn spreadsheet_row(enquiry: &Enquiry) -> Vec<String> {
    vec![
        enquiry.created_at.to_rfc3339(),
        enquiry.full_name.clone(),
        enquiry.email.to_string(),
        enquiry.query.clone(),
        enquiry.file_urls(),
        enquiry.status.to_string(),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::fakes::{FakeNotifier, FakeSheets, FakeStorage, MemoryStore};
    use super::*;

    fn submission() -> EnquirySubmission {
        EnquirySubmission {
            full_name: "Asha Rao".to_string(),
            email: "Asha@Example.com".to_string(),
            query: "Which ITR form applies to capital gains?".to_string(),
            attachments: Vec::new(),
        }
    }

    fn attachment(name: &str) -> Attachment {
        Attachment {
            file_name: name.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_zero_attachments_persists_empty_file_list() {
        let (storage, sheets, notifier, store) = (
            FakeStorage::default(),
            FakeSheets::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let enquiry = service.submit_enquiry(&store, submission()).await.unwrap();

        assert!(enquiry.files.is_empty());
        let stored = store.enquiries();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].files.is_empty());
        assert_eq!(stored[0].email.as_str(), "asha@example.com");

        let rows = sheets.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, SheetTab::Enquiries);
        assert_eq!(rows[0].1[1], "Asha Rao");
        assert_eq!(rows[0].1[4], "");
        assert_eq!(rows[0].1[5], "pending");

        assert_eq!(notifier.sent(), vec!["enquiry:asha@example.com".to_string()]);
        assert!(storage.uploaded().is_empty());
    }

    #[tokio::test]
    async fn test_attachments_keep_input_order() {
        let (storage, sheets, notifier, store) = (
            FakeStorage::default(),
            FakeSheets::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let mut form = submission();
        form.attachments = vec![attachment("form16.pdf"), attachment("26as.pdf")];
        let enquiry = service.submit_enquiry(&store, form).await.unwrap();

        let urls: Vec<_> = enquiry.files.iter().map(|f| f.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://cdn.test/form16.pdf", "https://cdn.test/26as.pdf"]
        );
        assert_eq!(
            sheets.rows()[0].1[4],
            "https://cdn.test/form16.pdf, https://cdn.test/26as.pdf"
        );
    }

    #[tokio::test]
    async fn test_invalid_form_has_no_side_effects() {
        let (storage, sheets, notifier, store) = (
            FakeStorage::default(),
            FakeSheets::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let form = EnquirySubmission {
            full_name: "  ".to_string(),
            email: "not-an-email".to_string(),
            query: String::new(),
            attachments: vec![attachment("a.pdf")],
        };
        let Err(IntakeError::Invalid(errors)) = service.submit_enquiry(&store, form).await else {
            panic!("expected validation error");
        };

        assert!(errors.has("full_name"));
        assert!(errors.has("email"));
        assert!(errors.has("query"));
        assert!(storage.uploaded().is_empty());
        assert!(store.enquiries().is_empty());
    }

    #[tokio::test]
    async fn test_too_many_and_empty_attachments() {
        let (storage, sheets, notifier, store) = (
            FakeStorage::default(),
            FakeSheets::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let mut form = submission();
        form.attachments = (0..=MAX_ATTACHMENTS)
            .map(|i| attachment(&format!("{i}.pdf")))
            .collect();
        form.attachments[0].bytes.clear();

        let Err(IntakeError::Invalid(errors)) = service.submit_enquiry(&store, form).await else {
            panic!("expected validation error");
        };
        assert_eq!(errors.get("files").len(), 2);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_before_saving() {
        let storage = FakeStorage::failing();
        let (sheets, notifier, store) = (
            FakeSheets::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let mut form = submission();
        form.attachments = vec![attachment("a.pdf")];
        let err = service.submit_enquiry(&store, form).await.unwrap_err();

        assert!(matches!(err, IntakeError::Upload(_)));
        assert!(store.enquiries().is_empty());
        assert!(sheets.rows().is_empty());
    }

    #[tokio::test]
    async fn test_spreadsheet_failure_keeps_saved_record() {
        let sheets = FakeSheets::failing();
        let (storage, notifier, store) = (
            FakeStorage::default(),
            FakeNotifier::default(),
            MemoryStore::default(),
        );
        let service = IntakeService::new(&storage, &sheets, &notifier);

        let err = service
            .submit_enquiry(&store, submission())
            .await
            .unwrap_err();

        assert!(matches!(err, IntakeError::Spreadsheet(_)));
        assert_eq!(store.enquiries().len(), 1);
        assert!(notifier.sent().is_empty());
    }
}
