//! Application e-mail composition and delivery.

pub mod message;
pub mod smtp;

pub use message::{ApplicationMessage, Attachment, Greeting, MessageComposer};
pub use smtp::{NotificationDispatcher, SmtpDispatcher, TlsMode, TransportError};
