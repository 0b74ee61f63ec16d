//! # Mailbox
//!
//! Alert email ingestion.
//!
//! Responsibilities:
//! - Fetch CCTV alert emails from a `MailStore` (IMAP or in-memory)
//! - Parse `DetectionEvent`s out of their bodies
//! - Archive handled messages into the processed folder
//! - Provide a random `MockEventSource` for running without an inbox

pub mod error;
#[cfg(feature = "imap")]
pub mod imap_store;
pub mod memory;
pub mod mock;
pub mod parser;
pub mod source;
pub mod store;

pub use contracts::{DetectionEvent, EventSource, EventType};
pub use error::{MailboxError, MessageParseError, Result};
#[cfg(feature = "imap")]
pub use imap_store::ImapMailStore;
pub use memory::MemoryMailStore;
pub use mock::MockEventSource;
pub use parser::parse_message;
pub use source::MailboxEventSource;
pub use store::{MailStore, RawMessage, SearchFilter};
