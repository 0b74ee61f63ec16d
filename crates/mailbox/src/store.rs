//! MailStore trait - mailbox access interface

use contracts::AlertFilterConfig;

use crate::error::Result;

/// One fetched message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Server-assigned UID, stable within the polled folder
    pub uid: u32,
    /// Plain-text body
    pub body: String,
}

impl RawMessage {
    pub fn new(uid: u32, body: impl Into<String>) -> Self {
        Self {
            uid,
            body: body.into(),
        }
    }
}

/// Which messages count as alerts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Required sender address
    pub sender: String,
    /// Required subject text (empty = any subject)
    pub subject: String,
    /// Skip messages already marked as seen
    pub unseen_only: bool,
}

impl SearchFilter {
    pub fn from_config(alerts: &AlertFilterConfig, unseen_only: bool) -> Self {
        Self {
            sender: alerts.email_sender.clone(),
            subject: alerts.email_subject_filter.clone(),
            unseen_only,
        }
    }

    /// IMAP SEARCH criteria for this filter
    pub fn to_imap_query(&self) -> String {
        let mut criteria = vec![format!("FROM {}", quote(&self.sender))];
        if !self.subject.is_empty() {
            criteria.push(format!("SUBJECT {}", quote(&self.subject)));
        }
        if self.unseen_only {
            criteria.push("UNSEEN".to_string());
        }
        criteria.join(" ")
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Mailbox access
///
/// Implementations own their connection handling; every call may open and
/// close a session.
#[trait_variant::make(MailStore: Send)]
pub trait LocalMailStore {
    /// Store name (used for logging)
    fn name(&self) -> &str;

    /// Fetch all messages matching `filter`, ordered by UID
    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<RawMessage>>;

    /// Create `folder` if it does not exist yet
    async fn ensure_folder(&self, folder: &str) -> Result<()>;

    /// Move the messages with `uids` into `folder`
    async fn move_messages(&self, uids: &[u32], folder: &str) -> Result<()>;
}
