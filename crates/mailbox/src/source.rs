//! MailboxEventSource - turns alert emails into detection events

use tracing::{debug, info, instrument, warn};

use contracts::{ContractError, DetectionEvent, EventSource, NotifierConfig};

use crate::parser::parse_message;
use crate::store::{MailStore, SearchFilter};

/// Hierarchy delimiter used for the processed folder path
pub const FOLDER_DELIMITER: &str = "/";

/// What happened to the fetched messages of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Archive {
    /// Nothing was fetched
    Nothing,
    /// Moved into the processed folder
    Moved,
    /// Left in place, no processed folder configured
    NoFolder,
    /// Left in place after a store error
    Failed,
}

/// Event source polling a mail store
///
/// Each poll fetches the matching messages, parses every body, and moves
/// the fetched messages into the processed folder (when one is configured).
/// Messages that fail to parse are logged and skipped.
pub struct MailboxEventSource<S> {
    store: S,
    filter: SearchFilter,
    processed_folder: Option<String>,
    folder_ready: bool,
}

impl<S> MailboxEventSource<S>
where
    S: MailStore + Sync,
{
    pub fn new(store: S, filter: SearchFilter, processed_folder: Option<String>) -> Self {
        Self {
            store,
            filter,
            processed_folder,
            folder_ready: false,
        }
    }

    /// Build from the notifier configuration
    pub fn from_config(store: S, config: &NotifierConfig) -> Self {
        Self::new(
            store,
            SearchFilter::from_config(&config.cctv_alerts, config.imap.unseen_only),
            config.imap.processed_folder_path(FOLDER_DELIMITER),
        )
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn archive(&mut self, uids: &[u32]) -> Archive {
        if uids.is_empty() {
            return Archive::Nothing;
        }
        let Some(folder) = self.processed_folder.as_deref() else {
            warn!(
                count = uids.len(),
                "No processed folder configured, INBOX size will grow"
            );
            return Archive::NoFolder;
        };

        if !self.folder_ready {
            if let Err(e) = self.store.ensure_folder(folder).await {
                warn!(folder, error = %e, "Could not create processed folder");
                return Archive::Failed;
            }
            self.folder_ready = true;
        }

        match self.store.move_messages(uids, folder).await {
            Ok(()) => {
                debug!(folder, count = uids.len(), "Archived alert emails");
                Archive::Moved
            }
            Err(e) => {
                warn!(folder, error = %e, "Could not archive alert emails");
                Archive::Failed
            }
        }
    }
}

impl<S> EventSource for MailboxEventSource<S>
where
    S: MailStore + Sync,
{
    fn name(&self) -> &str {
        self.store.name()
    }

    #[instrument(name = "mailbox_poll", skip(self), fields(store = %self.store.name()))]
    async fn poll_events(&mut self) -> Result<Vec<DetectionEvent>, ContractError> {
        let messages = self
            .store
            .fetch(&self.filter)
            .await
            .map_err(|e| ContractError::mailbox(self.store.name(), e.to_string()))?;

        let mut events = Vec::with_capacity(messages.len());
        for message in &messages {
            match parse_message(&message.body) {
                Ok(event) => events.push(event),
                Err(e) => {
                    warn!(uid = message.uid, error = %e, "Skipping unparseable alert email");
                }
            }
        }

        let uids: Vec<u32> = messages.iter().map(|m| m.uid).collect();
        self.archive(&uids).await;

        if !events.is_empty() {
            info!(fetched = messages.len(), events = events.len(), "Polled alert emails");
        }
        Ok(events)
    }
}
