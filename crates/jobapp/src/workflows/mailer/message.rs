use std::path::{Path, PathBuf};

use mime::Mime;

use crate::config::MailerConfig;
use crate::workflows::letter::{ApplicationDetails, ArtifactRef};

/// A file sent alongside the message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: Mime,
}

impl Attachment {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = mime_guess::from_path(&path).first_or_octet_stream();

        Self {
            path,
            file_name,
            content_type,
        }
    }
}

/// Salutation chosen from the local hour of sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Morning,
    Afternoon,
    Evening,
}

impl Greeting {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Greeting::Morning,
            12..=16 => Greeting::Afternoon,
            _ => Greeting::Evening,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Greeting::Morning => "Good morning",
            Greeting::Afternoon => "Good afternoon",
            Greeting::Evening => "Good evening",
        }
    }
}

/// Fully addressed message ready for a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMessage {
    pub from_name: String,
    pub from_address: String,
    pub to_name: String,
    pub to_address: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct MessageComposer {
    sender_name: String,
    sender_address: String,
    closing: String,
    attachments: Vec<PathBuf>,
}

impl MessageComposer {
    pub fn new(
        sender_name: impl Into<String>,
        sender_address: impl Into<String>,
        closing: impl Into<String>,
        attachments: Vec<PathBuf>,
    ) -> Self {
        Self {
            sender_name: sender_name.into(),
            sender_address: sender_address.into(),
            closing: closing.into(),
            attachments,
        }
    }

    pub fn from_config(config: &MailerConfig) -> Self {
        Self::new(
            config.sender_name.clone(),
            config.sender_email.clone(),
            config.closing.clone(),
            config.attachments.clone(),
        )
    }

    /// Compose the application e-mail; the compiled letter is attached first.
    pub fn compose(
        &self,
        details: &ApplicationDetails,
        artifact: &ArtifactRef,
        hour: u32,
    ) -> ApplicationMessage {
        let attachments = self.attachments_for(artifact.path());
        let attachment_names: Vec<&str> = attachments
            .iter()
            .map(|attachment| attachment.file_name.as_str())
            .collect();

        let mut body = format!(
            "{} {}:\n\n\
             I am writing to apply for the {} position; vacancy {}.\n\
             Attached: {}\n\n\
             {}\n",
            Greeting::for_hour(hour).label(),
            details.recipient_name,
            details.title,
            details.identifier,
            attachment_names.join(", "),
            self.closing
        );
        let signature = self.sender_name.trim();
        if !signature.is_empty() {
            body.push_str(signature);
            body.push('\n');
        }
        body.push('<');
        body.push_str(&self.sender_address);
        body.push('>');

        ApplicationMessage {
            from_name: self.sender_name.clone(),
            from_address: self.sender_address.clone(),
            to_name: details.recipient_name.clone(),
            to_address: details.recipient_address.clone(),
            subject: format!(
                "Application for {}; Vacancy {}",
                details.title, details.identifier
            ),
            body,
            attachments,
        }
    }

    fn attachments_for(&self, artifact: &Path) -> Vec<Attachment> {
        std::iter::once(artifact.to_path_buf())
            .chain(
                self.attachments
                    .iter()
                    .filter(|path| path.as_path() != artifact)
                    .cloned(),
            )
            .map(Attachment::from_path)
            .collect()
    }
}
