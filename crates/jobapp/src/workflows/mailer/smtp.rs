use std::fmt::{self, Debug};
use std::path::PathBuf;
use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::message::ApplicationMessage;
use crate::config::MailerConfig;

/// Delivers a composed message to its recipient.
pub trait NotificationDispatcher: Debug {
    fn deliver(&self, message: &ApplicationMessage) -> Result<(), TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("`{address}` is not a valid e-mail address: {source}")]
    Address {
        address: String,
        source: AddressError,
    },
    #[error("attachment content type `{0}` is not usable")]
    ContentType(String),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// Plain connection upgraded with STARTTLS (submission port 587).
    #[default]
    Starttls,
    /// TLS from the first byte (port 465).
    Wrapper,
    /// No encryption; only for local relays.
    #[serde(rename = "none")]
    Plain,
}

/// Single-attempt SMTP delivery with the sender's credentials.
#[derive(Clone)]
pub struct SmtpDispatcher {
    host: String,
    port: u16,
    tls: TlsMode,
    username: String,
    password: String,
    timeout: Duration,
}

impl SmtpDispatcher {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: TlsMode,
        credentials: Option<(String, String)>,
        timeout: Duration,
    ) -> Self {
        let (username, password) = credentials.unwrap_or_default();
        Self {
            host: host.into(),
            port,
            tls,
            username,
            password,
            timeout,
        }
    }

    pub fn from_config(config: &MailerConfig) -> Self {
        let credentials = (!config.sender_password.is_empty())
            .then(|| (config.sender_email.clone(), config.sender_password.clone()));
        Self::new(
            config.smtp_server_address.clone(),
            config.smtp_port,
            config.tls,
            credentials,
            config.timeout(),
        )
    }

    fn transport(&self) -> Result<SmtpTransport, TransportError> {
        let builder = match self.tls {
            TlsMode::Starttls => SmtpTransport::starttls_relay(&self.host)?,
            TlsMode::Wrapper => SmtpTransport::relay(&self.host)?,
            TlsMode::Plain => SmtpTransport::builder_dangerous(&self.host),
        };

        let mut builder = builder.port(self.port).timeout(Some(self.timeout));
        if !self.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

impl Debug for SmtpDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpDispatcher")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher for SmtpDispatcher {
    fn deliver(&self, message: &ApplicationMessage) -> Result<(), TransportError> {
        let email = build_email(message)?;
        let transport = self.transport()?;

        debug!(host = %self.host, port = self.port, "opening smtp session");
        let response = transport.send(&email)?;
        info!(to = %message.to_address, code = %response.code(), "application e-mail accepted");
        Ok(())
    }
}

fn mailbox(name: &str, address: &str) -> Result<Mailbox, TransportError> {
    let parsed: Address = address
        .trim()
        .parse()
        .map_err(|source| TransportError::Address {
            address: address.to_string(),
            source,
        })?;
    let name = Some(name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, parsed))
}

/// Encode the message as a multipart/mixed e-mail, reading attachments from disk.
pub(crate) fn build_email(message: &ApplicationMessage) -> Result<Message, TransportError> {
    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));

    for attachment in &message.attachments {
        let bytes = std::fs::read(&attachment.path).map_err(|source| {
            TransportError::Attachment {
                path: attachment.path.clone(),
                source,
            }
        })?;
        let content_type = ContentType::parse(attachment.content_type.essence_str())
            .map_err(|_| TransportError::ContentType(attachment.content_type.to_string()))?;
        parts = parts.singlepart(
            MimeAttachment::new(attachment.file_name.clone()).body(bytes, content_type),
        );
    }

    let email = Message::builder()
        .from(mailbox(&message.from_name, &message.from_address)?)
        .to(mailbox(&message.to_name, &message.to_address)?)
        .subject(message.subject.clone())
        .multipart(parts)?;
    Ok(email)
}
