//! NotifierConfig - Config Loader output
//!
//! Describes the full notifier configuration: inbox access, alert filters,
//! DVR access, clip storage and dispatch policy.

use serde::{Deserialize, Serialize};

/// Complete notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Inbox connection and polling
    pub imap: ImapConfig,

    /// Which emails count as CCTV alerts
    pub cctv_alerts: AlertFilterConfig,

    /// DVR access for clip capture
    pub dvr: DvrConfig,

    /// Where and how long clips are recorded
    pub stream_capture: StreamCaptureConfig,

    /// Worker pool and retry policy
    #[serde(default)]
    pub dispatch: DispatchSettings,
}

/// IMAP inbox settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImapConfig {
    /// Server host name
    pub server: String,

    /// Server port (implicit TLS)
    #[serde(default = "default_imap_port")]
    pub port: u16,

    /// Login user name
    pub username: String,

    /// Environment variable holding the login password
    #[serde(default = "default_imap_password_env")]
    pub password_env: String,

    /// Mailbox polled for alerts
    #[serde(default = "default_mailbox")]
    pub mailbox: String,

    /// Only fetch messages not yet marked as seen
    #[serde(default)]
    pub unseen_only: bool,

    /// Seconds between polls
    #[serde(default = "default_polling_frequency")]
    pub polling_frequency_secs: u64,

    /// Sub-folder of the mailbox where handled alerts are archived.
    /// `None` leaves them in place.
    #[serde(default)]
    pub processed_folder: Option<String>,
}

impl ImapConfig {
    /// Full path of the processed folder using the given hierarchy delimiter
    pub fn processed_folder_path(&self, delimiter: &str) -> Option<String> {
        self.processed_folder
            .as_ref()
            .map(|folder| format!("{}{}{}", self.mailbox, delimiter, folder))
    }
}

fn default_imap_port() -> u16 {
    993
}

fn default_imap_password_env() -> String {
    "IMAP_PASSWORD".to_string()
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn default_polling_frequency() -> u64 {
    60
}

/// Alert email filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertFilterConfig {
    /// Sender address of the DVR's alert emails
    pub email_sender: String,

    /// Subject text the alert emails contain
    #[serde(default)]
    pub email_subject_filter: String,
}

/// DVR access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DvrConfig {
    /// DVR host name or address
    pub host: String,

    /// RTSP port
    #[serde(default = "default_rtsp_port")]
    pub rtsp_port: u16,

    /// DVR user name
    #[serde(default = "default_dvr_username")]
    pub username: String,

    /// Environment variable holding the DVR password
    #[serde(default = "default_dvr_password_env")]
    pub password_env: String,
}

fn default_rtsp_port() -> u16 {
    554
}

fn default_dvr_username() -> String {
    "admin".to_string()
}

fn default_dvr_password_env() -> String {
    "DVR_PASSWORD".to_string()
}

/// Clip capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamCaptureConfig {
    /// Root directory for recorded clips
    pub storage_location: String,

    /// Length of each clip in seconds
    #[serde(default = "default_clip_length")]
    pub detection_clip_length_secs: u64,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Extra seconds allowed beyond the clip length before a capture is killed
    #[serde(default = "default_capture_grace")]
    pub capture_grace_secs: u64,
}

fn default_clip_length() -> u64 {
    5
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_capture_grace() -> u64 {
    10
}

/// Dispatch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSettings {
    /// Number of concurrent capture workers
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Retry policy for failed captures
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            retry: RetrySettings::default(),
        }
    }
}

fn default_max_workers() -> usize {
    4
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total rounds including the first one (0 = retry until success)
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Delay before the first retry round (ms)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff growth factor per retry round
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Upper bound for the backoff delay (ms)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl RetrySettings {
    /// Whether retries stop only when every event succeeded
    pub fn is_unbounded(&self) -> bool {
        self.max_rounds == 0
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            initial_backoff_ms: default_initial_backoff_ms(),
            multiplier: default_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_rounds() -> u32 {
    10
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_defaults() {
        let settings = DispatchSettings::default();
        assert_eq!(settings.max_workers, 4);
        assert_eq!(settings.retry.max_rounds, 10);
        assert!(!settings.retry.is_unbounded());
    }

    #[test]
    fn imap_defaults_from_json() {
        let imap: ImapConfig =
            serde_json::from_str(r#"{ "server": "imap.example.com", "username": "u" }"#).unwrap();
        assert_eq!(imap.port, 993);
        assert_eq!(imap.mailbox, "INBOX");
        assert_eq!(imap.password_env, "IMAP_PASSWORD");
        assert_eq!(imap.polling_frequency_secs, 60);
        assert!(imap.processed_folder.is_none());
    }

    #[test]
    fn processed_folder_path_uses_delimiter() {
        let mut imap: ImapConfig =
            serde_json::from_str(r#"{ "server": "s", "username": "u" }"#).unwrap();
        assert_eq!(imap.processed_folder_path("/"), None);

        imap.processed_folder = Some("processed".into());
        assert_eq!(
            imap.processed_folder_path("/").as_deref(),
            Some("INBOX/processed")
        );
        assert_eq!(
            imap.processed_folder_path("|").as_deref(),
            Some("INBOX|processed")
        );
    }
}
