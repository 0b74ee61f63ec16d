//! In-memory mail store
//!
//! Keeps folders and messages in process memory. Used by tests and by
//! dry runs that should not touch a real inbox.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{MailboxError, Result};
use crate::store::{MailStore, RawMessage, SearchFilter};

#[derive(Debug, Clone)]
struct StoredMessage {
    uid: u32,
    from: String,
    subject: String,
    body: String,
    seen: bool,
}

#[derive(Debug, Default)]
struct State {
    next_uid: u32,
    folders: BTreeMap<String, Vec<StoredMessage>>,
}

/// Mail store backed by a map of folders
#[derive(Debug)]
pub struct MemoryMailStore {
    name: String,
    mailbox: String,
    state: Mutex<State>,
}

impl MemoryMailStore {
    /// Create a store whose polled folder is `mailbox`
    pub fn new(mailbox: impl Into<String>) -> Self {
        let mailbox = mailbox.into();
        let mut folders = BTreeMap::new();
        folders.insert(mailbox.clone(), Vec::new());
        Self {
            name: format!("memory:{mailbox}"),
            mailbox,
            state: Mutex::new(State {
                next_uid: 1,
                folders,
            }),
        }
    }

    /// Deliver a message into the polled folder, returning its UID
    pub fn deliver(&self, from: &str, subject: &str, body: &str) -> u32 {
        let mut state = self.lock();
        let uid = state.next_uid;
        state.next_uid += 1;
        let mailbox = self.mailbox.clone();
        state.folders.entry(mailbox).or_default().push(StoredMessage {
            uid,
            from: from.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            seen: false,
        });
        uid
    }

    /// UIDs currently stored in `folder`
    pub fn uids_in(&self, folder: &str) -> Vec<u32> {
        self.lock()
            .folders
            .get(folder)
            .map(|messages| messages.iter().map(|m| m.uid).collect())
            .unwrap_or_default()
    }

    /// Whether `folder` exists
    pub fn has_folder(&self, folder: &str) -> bool {
        self.lock().folders.contains_key(folder)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn matches(message: &StoredMessage, filter: &SearchFilter) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    contains(&message.from, &filter.sender)
        && (filter.subject.is_empty() || contains(&message.subject, &filter.subject))
        && !(filter.unseen_only && message.seen)
}

impl MailStore for MemoryMailStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<RawMessage>> {
        let mut state = self.lock();
        let messages = state
            .folders
            .get_mut(&self.mailbox)
            .ok_or_else(|| MailboxError::FolderNotFound {
                folder: self.mailbox.clone(),
            })?;

        let fetched: Vec<RawMessage> = messages
            .iter_mut()
            .filter(|m| matches(m, filter))
            .map(|m| {
                m.seen = true;
                RawMessage::new(m.uid, m.body.clone())
            })
            .collect();

        debug!(store = %self.name, count = fetched.len(), "Fetched messages");
        Ok(fetched)
    }

    async fn ensure_folder(&self, folder: &str) -> Result<()> {
        self.lock().folders.entry(folder.to_string()).or_default();
        Ok(())
    }

    async fn move_messages(&self, uids: &[u32], folder: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.folders.contains_key(folder) {
            return Err(MailboxError::FolderNotFound {
                folder: folder.to_string(),
            });
        }

        let source = state.folders.entry(self.mailbox.clone()).or_default();
        let (moved, kept): (Vec<_>, Vec<_>) =
            source.drain(..).partition(|m| uids.contains(&m.uid));
        *source = kept;

        state.folders.entry(folder.to_string()).or_default().extend(moved);
        Ok(())
    }
}
