//! Delivery of the catalog PDF by email

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::SmtpSettings;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait PdfMailer: Send + Sync {
    async fn send_pdf(
        &self,
        username: &str,
        recipient: &str,
        attachment: PdfAttachment,
    ) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Implicit-TLS relay (port 465 by default), authenticated as the sender.
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let sender = Mailbox::new(settings.sender_name.clone(), settings.sender_email.parse()?);
        let credentials = Credentials::new(settings.sender_email.clone(), settings.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, sender })
    }
}

#[async_trait]
impl PdfMailer for SmtpMailer {
    async fn send_pdf(
        &self,
        username: &str,
        recipient: &str,
        attachment: PdfAttachment,
    ) -> Result<(), MailError> {
        let message = compose(&self.sender, username, recipient, attachment)?;
        self.transport.send(message).await?;
        tracing::info!(recipient, "email sent");
        Ok(())
    }
}

/// Stand-in used when no SMTP credentials were configured.
pub struct UnconfiguredMailer;

#[async_trait]
impl PdfMailer for UnconfiguredMailer {
    async fn send_pdf(
        &self,
        _username: &str,
        _recipient: &str,
        _attachment: PdfAttachment,
    ) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

fn compose(
    sender: &Mailbox,
    username: &str,
    recipient: &str,
    attachment: PdfAttachment,
) -> Result<Message, MailError> {
    let pdf = Attachment::new(attachment.file_name.clone())
        .body(attachment.bytes, ContentType::parse("application/pdf")?);

    let message = Message::builder()
        .from(sender.clone())
        .to(recipient.parse()?)
        .subject(format!("Your PDF file {}", attachment.file_name))
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(format!(
                    "Hello {username},\n\nPlease find the requested PDF attached."
                )))
                .singlepart(pdf),
        )?;

    Ok(message)
}
