//! Event source selection.
//!
//! The inbox source needs the `imap` feature; without it only the mock
//! source is available.

use anyhow::Result;
use contracts::{ContractError, DetectionEvent, EventSource, NotifierConfig};
use mailbox::MockEventSource;

#[cfg(feature = "imap")]
use mailbox::{ImapMailStore, MailboxEventSource};

/// Where events come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// The configured IMAP inbox
    Mailbox,
    /// Randomly generated events
    Mock,
}

/// Event source used by the poll loop
pub enum NotifierSource {
    Mock(MockEventSource),
    #[cfg(feature = "imap")]
    Imap(MailboxEventSource<ImapMailStore>),
}

impl NotifierSource {
    /// Build the source for `mode`
    ///
    /// # Errors
    /// The IMAP password is missing, or the binary was built without IMAP
    /// support and `mode` is `Mailbox`.
    pub fn build(mode: SourceMode, config: &NotifierConfig) -> Result<Self> {
        match mode {
            SourceMode::Mock => Ok(Self::Mock(MockEventSource::new())),
            SourceMode::Mailbox => Self::mailbox(config),
        }
    }

    #[cfg(feature = "imap")]
    fn mailbox(config: &NotifierConfig) -> Result<Self> {
        use anyhow::Context;

        let password = config_loader::resolve_secret(&config.imap.password_env)
            .context("IMAP password is not available")?;
        let store = ImapMailStore::new(&config.imap, password);
        Ok(Self::Imap(MailboxEventSource::from_config(store, config)))
    }

    #[cfg(not(feature = "imap"))]
    fn mailbox(_config: &NotifierConfig) -> Result<Self> {
        anyhow::bail!(
            "this build has no IMAP support; rebuild with `--features imap` or run with --mock"
        )
    }
}

impl EventSource for NotifierSource {
    fn name(&self) -> &str {
        match self {
            Self::Mock(source) => source.name(),
            #[cfg(feature = "imap")]
            Self::Imap(source) => source.name(),
        }
    }

    async fn poll_events(&mut self) -> Result<Vec<DetectionEvent>, ContractError> {
        match self {
            Self::Mock(source) => source.poll_events().await,
            #[cfg(feature = "imap")]
            Self::Imap(source) => source.poll_events().await,
        }
    }
}
