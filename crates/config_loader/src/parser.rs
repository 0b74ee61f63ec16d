//! Configuration parsing
//!
//! Supports TOML (primary) and JSON formats.

use contracts::{ContractError, NotifierConfig};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML configuration
pub fn parse_toml(content: &str) -> Result<NotifierConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON configuration
pub fn parse_json(content: &str) -> Result<NotifierConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<NotifierConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[imap]
server = "imap.example.com"
username = "alerts@example.com"

[cctv_alerts]
email_sender = "dvr@example.com"
email_subject_filter = "Alarm"

[dvr]
host = "192.168.1.64"

[stream_capture]
storage_location = "/tmp/cctv"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let cfg = result.unwrap();
        assert_eq!(cfg.imap.server, "imap.example.com");
        assert_eq!(cfg.dvr.rtsp_port, 554);
        assert_eq!(cfg.dvr.username, "admin");
        assert_eq!(cfg.stream_capture.detection_clip_length_secs, 5);
        assert_eq!(cfg.dispatch.max_workers, 4);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "imap": { "server": "imap.example.com", "username": "u", "unseen_only": true },
            "cctv_alerts": { "email_sender": "dvr@example.com" },
            "dvr": { "host": "dvr.local", "rtsp_port": 8554 },
            "stream_capture": { "storage_location": "/tmp/cctv" },
            "dispatch": { "max_workers": 2, "retry": { "max_rounds": 0 } }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let cfg = result.unwrap();
        assert!(cfg.imap.unseen_only);
        assert_eq!(cfg.dvr.rtsp_port, 8554);
        assert_eq!(cfg.dispatch.max_workers, 2);
        assert!(cfg.dispatch.retry.is_unbounded());
        assert_eq!(cfg.dispatch.retry.initial_backoff_ms, 500);
    }

    #[test]
    fn test_parse_toml_missing_section() {
        let content = r#"
[imap]
server = "imap.example.com"
username = "u"
"#;
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("cctv_alerts"), "got: {err}");
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
