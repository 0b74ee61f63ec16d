//! IMAP mail store
//!
//! Wraps the blocking `imap` client. Every operation opens its own TLS
//! session on the blocking thread pool and logs out when done.

use std::net::TcpStream;
use std::sync::Arc;

use mailparse::{MailHeaderMap, ParsedMail};
use native_tls::{TlsConnector, TlsStream};
use tracing::{debug, instrument};

use contracts::ImapConfig;

use crate::error::{MailboxError, Result};
use crate::store::{MailStore, RawMessage, SearchFilter};

type Session = imap::Session<TlsStream<TcpStream>>;

#[derive(Clone)]
struct Credentials {
    server: String,
    port: u16,
    username: String,
    password: String,
    mailbox: String,
}

/// Mail store talking to an IMAP server over implicit TLS
#[derive(Clone)]
pub struct ImapMailStore {
    name: String,
    credentials: Arc<Credentials>,
}

impl ImapMailStore {
    /// `password` is the resolved secret, not the env var name
    pub fn new(config: &ImapConfig, password: impl Into<String>) -> Self {
        Self {
            name: format!("imap:{}@{}", config.username, config.server),
            credentials: Arc::new(Credentials {
                server: config.server.clone(),
                port: config.port,
                username: config.username.clone(),
                password: password.into(),
                mailbox: config.mailbox.clone(),
            }),
        }
    }

    /// Run `op` inside a logged-in session with the polled mailbox selected
    async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
    {
        let credentials = Arc::clone(&self.credentials);
        tokio::task::spawn_blocking(move || {
            let mut session = open_session(&credentials)?;
            session.select(&credentials.mailbox)?;
            let result = op(&mut session);
            if let Err(e) = session.logout() {
                debug!(error = %e, "IMAP logout failed");
            }
            result
        })
        .await
        .map_err(|e| MailboxError::Task {
            message: e.to_string(),
        })?
    }
}

fn open_session(credentials: &Credentials) -> Result<Session> {
    let tls = TlsConnector::builder().build()?;
    let client = imap::connect(
        (credentials.server.as_str(), credentials.port),
        &credentials.server,
        &tls,
    )?;
    client
        .login(&credentials.username, &credentials.password)
        .map_err(|(e, _client)| MailboxError::from(e))
}

fn sequence_set(uids: impl IntoIterator<Item = u32>) -> String {
    uids.into_iter()
        .map(|uid| uid.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// First `text/plain` part of a message, or its only body
fn plain_text(mail: &ParsedMail<'_>) -> Option<String> {
    if mail.subparts.is_empty() {
        return mail.get_body().ok();
    }
    mail.subparts.iter().find_map(|part| {
        if part.subparts.is_empty() && part.ctype.mimetype != "text/plain" {
            None
        } else {
            plain_text(part)
        }
    })
}

fn decode_message(uid: u32, raw: &[u8]) -> Result<RawMessage> {
    let mail = mailparse::parse_mail(raw)
        .map_err(|e| MailboxError::protocol(format!("message {uid}: {e}")))?;
    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();
    debug!(uid, subject, "Decoded alert email");
    let body = plain_text(&mail).unwrap_or_default();
    Ok(RawMessage::new(uid, body))
}

impl MailStore for ImapMailStore {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "imap_fetch", skip_all, fields(store = %self.name))]
    async fn fetch(&self, filter: &SearchFilter) -> Result<Vec<RawMessage>> {
        let query = filter.to_imap_query();
        self.with_session(move |session| {
            let mut uids: Vec<u32> = session.uid_search(&query)?.into_iter().collect();
            if uids.is_empty() {
                return Ok(Vec::new());
            }
            uids.sort_unstable();

            let fetched = session.uid_fetch(sequence_set(uids), "RFC822")?;
            let mut messages = Vec::with_capacity(fetched.len());
            for fetch in fetched.iter() {
                let (Some(uid), Some(body)) = (fetch.uid, fetch.body()) else {
                    continue;
                };
                messages.push(decode_message(uid, body)?);
            }
            messages.sort_by_key(|m| m.uid);
            Ok(messages)
        })
        .await
    }

    #[instrument(name = "imap_ensure_folder", skip(self), fields(store = %self.name))]
    async fn ensure_folder(&self, folder: &str) -> Result<()> {
        let folder = folder.to_string();
        self.with_session(move |session| {
            let existing = session.list(Some(""), Some(&folder))?;
            if existing.iter().any(|name| name.name() == folder) {
                return Ok(());
            }
            session.create(&folder)?;
            debug!(folder, "Created folder");
            Ok(())
        })
        .await
    }

    #[instrument(name = "imap_move", skip(self, uids), fields(store = %self.name, count = uids.len()))]
    async fn move_messages(&self, uids: &[u32], folder: &str) -> Result<()> {
        if uids.is_empty() {
            return Ok(());
        }
        let set = sequence_set(uids.iter().copied());
        let folder = folder.to_string();
        self.with_session(move |session| {
            session.uid_mv(&set, &folder)?;
            Ok(())
        })
        .await
    }
}
