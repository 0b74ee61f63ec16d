//! Mailbox error types

use thiserror::Error;

/// Mail store errors
#[derive(Debug, Error)]
pub enum MailboxError {
    /// Could not reach or log in to the server
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Server rejected a command
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// Target folder does not exist
    #[error("folder '{folder}' does not exist")]
    FolderNotFound { folder: String },

    /// Background task running the blocking client failed
    #[error("mailbox task failed: {message}")]
    Task { message: String },
}

impl MailboxError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

#[cfg(feature = "imap")]
impl From<imap::Error> for MailboxError {
    fn from(e: imap::Error) -> Self {
        match e {
            imap::Error::Io(_)
            | imap::Error::Tls(_)
            | imap::Error::TlsHandshake(_)
            | imap::Error::ConnectionLost => Self::connection(e.to_string()),
            other => Self::protocol(other.to_string()),
        }
    }
}

#[cfg(feature = "imap")]
impl From<native_tls::Error> for MailboxError {
    fn from(e: native_tls::Error) -> Self {
        Self::connection(e.to_string())
    }
}

/// Why an alert email body could not be turned into an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    #[error("Could not extract the event type from the email.")]
    EventType,

    #[error("Could not extract the camera IDs from the email.")]
    CameraIds,

    #[error("Could not extract the event date/time from the email.")]
    DateTime,
}

/// Mailbox Result type alias
pub type Result<T> = std::result::Result<T, MailboxError>;
