//! Email service for confirmations and internal notifications.
//!
//! Uses SMTP via lettre for delivery with Askama templates for the text and
//! HTML parts.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{ContactMessage, Enquiry, StoredFile, Subscriber};

/// HTML template for the enquiry confirmation sent to the submitter.
#[derive(Template)]
#[template(path = "email/enquiry_received.html")]
struct EnquiryReceivedHtml<'a> {
    full_name: &'a str,
    query: &'a str,
    files: &'a [StoredFile],
}

/// Plain text template for the enquiry confirmation.
#[derive(Template)]
#[template(path = "email/enquiry_received.txt")]
struct EnquiryReceivedText<'a> {
    full_name: &'a str,
    query: &'a str,
    files: &'a [StoredFile],
}

#[derive(Template)]
#[template(path = "email/new_subscriber.html")]
struct NewSubscriberHtml<'a> {
    email: &'a str,
    phone: &'a str,
    subscribed_at: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_subscriber.txt")]
struct NewSubscriberText<'a> {
    email: &'a str,
    phone: &'a str,
    subscribed_at: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_contact.html")]
struct NewContactHtml<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

#[derive(Template)]
#[template(path = "email/new_contact.txt")]
struct NewContactText<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Outbound mail triggered by form submissions.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Confirm receipt of an enquiry to the person who submitted it.
    async fn enquiry_received(&self, enquiry: &Enquiry) -> Result<(), EmailError>;

    /// Tell the team about a new subscriber.
    async fn new_subscriber(&self, subscriber: &Subscriber) -> Result<(), EmailError>;

    /// Forward a contact message to the team.
    async fn new_contact_message(&self, message: &ContactMessage) -> Result<(), EmailError>;
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    notify: Mailbox,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or an address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from: parse_mailbox(&config.from_address)?,
            notify: parse_mailbox(&config.notify_address)?,
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: Mailbox,
        reply_to: Option<Mailbox>,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }

        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body),
                ),
        )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to.email, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn enquiry_received(&self, enquiry: &Enquiry) -> Result<(), EmailError> {
        let html = EnquiryReceivedHtml {
            full_name: &enquiry.full_name,
            query: &enquiry.query,
            files: &enquiry.files,
        }
        .render()?;
        let text = EnquiryReceivedText {
            full_name: &enquiry.full_name,
            query: &enquiry.query,
            files: &enquiry.files,
        }
        .render()?;

        let to = Mailbox::new(
            Some(enquiry.full_name.clone()),
            parse_address(enquiry.email.as_str())?,
        );

        self.send_multipart_email(
            to,
            Some(self.notify.clone()),
            "We've received your enquiry",
            text,
            html,
        )
        .await
    }

    async fn new_subscriber(&self, subscriber: &Subscriber) -> Result<(), EmailError> {
        let email = subscriber.email.as_ref().map_or("-", |e| e.as_str());
        let phone = subscriber.phone.as_ref().map_or("-", |p| p.as_str());
        let subscribed_at = subscriber.subscribed_at.to_rfc3339();

        let html = NewSubscriberHtml {
            email,
            phone,
            subscribed_at: &subscribed_at,
        }
        .render()?;
        let text = NewSubscriberText {
            email,
            phone,
            subscribed_at: &subscribed_at,
        }
        .render()?;

        self.send_multipart_email(self.notify.clone(), None, "New subscriber", text, html)
            .await
    }

    async fn new_contact_message(&self, message: &ContactMessage) -> Result<(), EmailError> {
        let html = NewContactHtml {
            name: &message.name,
            email: message.email.as_str(),
            message: &message.message,
        }
        .render()?;
        let text = NewContactText {
            name: &message.name,
            email: message.email.as_str(),
            message: &message.message,
        }
        .render()?;

        let reply_to = Mailbox::new(
            Some(message.name.clone()),
            parse_address(message.email.as_str())?,
        );

        self.send_multipart_email(
            self.notify.clone(),
            Some(reply_to),
            &format!("Contact form: {}", message.name),
            text,
            html,
        )
        .await
    }
}

fn parse_mailbox(value: &str) -> Result<Mailbox, EmailError> {
    value
        .parse()
        .map_err(|_| EmailError::InvalidAddress(value.to_string()))
}

fn parse_address(value: &str) -> Result<lettre::Address, EmailError> {
    value
        .parse()
        .map_err(|_| EmailError::InvalidAddress(value.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mailbox_with_display_name() {
        let mailbox = parse_mailbox("Taxpoint <hello@taxpoint.test>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Taxpoint"));
        assert_eq!(mailbox.email.to_string(), "hello@taxpoint.test");
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_enquiry_template_lists_files() {
        let files = vec![StoredFile {
            url: "https://cdn.test/itr.pdf".to_string(),
            storage_id: "enquiries/itr".to_string(),
        }];
        let text = EnquiryReceivedText {
            full_name: "Asha Rao",
            query: "Do I need to file ITR-2?",
            files: &files,
        }
        .render()
        .unwrap();

        assert!(text.contains("Asha Rao"));
        assert!(text.contains("https://cdn.test/itr.pdf"));
    }

    #[test]
    fn test_contact_html_escapes_input() {
        let html = NewContactHtml {
            name: "<script>",
            email: "a@b.com",
            message: "hi",
        }
        .render()
        .unwrap();

        assert!(!html.contains("<script>"));
    }
}
