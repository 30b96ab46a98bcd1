//! Newsletter subscription pipeline.

use serde::Deserialize;
use tracing::instrument;

use taxpoint_core::{Email, FieldErrors, Phone};

use super::{IntakeError, IntakeService, SubscriberStore};
use crate::db::RepositoryError;
use crate::models::{NewSubscriber, Subscriber};
use crate::services::sheets::SheetTab;

/// Subscription request body. Blank strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl SubscriptionRequest {
    fn parse(&self) -> Result<NewSubscriber, IntakeError> {
        let email = non_blank(self.email.as_deref());
        let phone = non_blank(self.phone.as_deref());
        if email.is_none() && phone.is_none() {
            return Err(IntakeError::MissingContact);
        }

        let mut errors = FieldErrors::new();
        let email = email.and_then(|value| match Email::parse(value) {
            Ok(email) => Some(email),
            Err(e) => {
                errors.add("email", e.to_string());
                None
            }
        });
        let phone = phone.and_then(|value| match Phone::parse(value) {
            Ok(phone) => Some(phone),
            Err(e) => {
                errors.add("phone", e.to_string());
                None
            }
        });
        errors.into_result().map_err(IntakeError::Invalid)?;

        Ok(NewSubscriber { email, phone })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl IntakeService<'_> {
    /// Validate, reject duplicates, save, append a spreadsheet row and notify
    /// the team.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::MissingContact` if neither field is given,
    /// `Invalid` for a malformed value, `AlreadySubscribed` if either value is
    /// already on the list, otherwise the error of the first failing step.
    #[instrument(skip_all)]
    pub async fn subscribe(
        &self,
        store: &dyn SubscriberStore,
        request: &SubscriptionRequest,
    ) -> Result<Subscriber, IntakeError> {
        let new = request.parse()?;

        if store
            .find_subscriber(new.email.as_ref(), new.phone.as_ref())
            .await?
            .is_some()
        {
            return Err(IntakeError::AlreadySubscribed);
        }

        let subscriber = store.insert_subscriber(&new).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => IntakeError::AlreadySubscribed,
            other => IntakeError::Persist(other),
        })?;

        self.sheets
            .append_row(SheetTab::Subscribers, spreadsheet_row(&subscriber))
            .await?;

        self.notifier.new_subscriber(&subscriber).await?;

        tracing::info!(subscriber_id = %subscriber.id, "New subscriber");
        Ok(subscriber)
    }
}

/// `[subscribed_at, email, phone]`
fn spreadsheet_row(subscriber: &Subscriber) -> Vec<String> {
    vec![
        subscriber.subscribed_at.to_rfc3339(),
        subscriber.email.as_ref().map(ToString::to_string).unwrap_or_default(),
        subscriber.phone.as_ref().map(ToString::to_string).unwrap_or_default(),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::fakes::{FakeNotifier, FakeSheets, FakeStorage, MemoryStore};
    use super::*;

    fn request(email: Option<&str>, phone: Option<&str>) -> SubscriptionRequest {
        SubscriptionRequest {
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    struct Harness {
        storage: FakeStorage,
        sheets: FakeSheets,
        notifier: FakeNotifier,
        store: MemoryStore,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                storage: FakeStorage::default(),
                sheets: FakeSheets::default(),
                notifier: FakeNotifier::default(),
                store: MemoryStore::default(),
            }
        }

        async fn subscribe(
            &self,
            request: &SubscriptionRequest,
        ) -> Result<Subscriber, IntakeError> {
            IntakeService::new(&self.storage, &self.sheets, &self.notifier)
                .subscribe(&self.store, request)
                .await
        }
    }

    #[tokio::test]
    async fn test_rejects_request_without_email_or_phone() {
        let h = Harness::new();

        for req in [
            request(None, None),
            request(Some(""), Some("   ")),
            SubscriptionRequest::default(),
        ] {
            assert!(matches!(
                h.subscribe(&req).await,
                Err(IntakeError::MissingContact)
            ));
        }
        assert!(h.store.subscribers().is_empty());
        assert!(h.sheets.rows().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_invalid_values() {
        let h = Harness::new();

        let Err(IntakeError::Invalid(errors)) =
            h.subscribe(&request(Some("nope"), Some("12ab"))).await
        else {
            panic!("expected validation error");
        };
        assert!(errors.has("email"));
        assert!(errors.has("phone"));
    }

    #[tokio::test]
    async fn test_rejects_duplicate_email() {
        let h = Harness::new();
        h.subscribe(&request(Some("owner@firm.in"), None))
            .await
            .unwrap();

        let second = h.subscribe(&request(Some(" Owner@Firm.in "), Some("+91 98765 43210"))).await;

        assert!(matches!(second, Err(IntakeError::AlreadySubscribed)));
        assert_eq!(h.store.subscribers().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_duplicate_phone() {
        let h = Harness::new();
        h.subscribe(&request(None, Some("+91 98765-43210")))
            .await
            .unwrap();

        let second = h.subscribe(&request(Some("new@firm.in"), Some("+919876543210"))).await;

        assert!(matches!(second, Err(IntakeError::AlreadySubscribed)));
        assert_eq!(h.store.subscribers().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_conflict_is_a_duplicate() {
        let mut h = Harness::new();
        h.store = MemoryStore::conflicting();

        assert!(matches!(
            h.subscribe(&request(Some("race@firm.in"), None)).await,
            Err(IntakeError::AlreadySubscribed)
        ));
    }

    #[tokio::test]
    async fn test_success_appends_row_and_notifies() {
        let h = Harness::new();

        let subscriber = h.subscribe(&request(None, Some("(022) 4000 1234"))).await.unwrap();

        assert_eq!(subscriber.phone.as_ref().unwrap().as_str(), "02240001234");
        let rows = h.sheets.rows();
        assert_eq!(rows[0].0, SheetTab::Subscribers);
        assert_eq!(rows[0].1[1], "");
        assert_eq!(rows[0].1[2], "02240001234");
        assert_eq!(h.notifier.sent(), vec!["subscriber:02240001234".to_string()]);
    }
}
