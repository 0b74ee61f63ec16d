//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `NotifierConfig`
//! - Resolve secrets referenced by the configuration
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("config.toml")).unwrap();
//! println!("Inbox: {}", config.imap.server);
//! ```

mod parser;
mod secret;
mod validator;

pub use contracts::NotifierConfig;
pub use parser::ConfigFormat;
pub use secret::resolve_secret;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<NotifierConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<NotifierConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize NotifierConfig to TOML string
    pub fn to_toml(config: &NotifierConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize NotifierConfig to JSON string
    pub fn to_json(config: &NotifierConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<NotifierConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        tracing::debug!(
            server = %config.imap.server,
            dvr = %config.dvr.host,
            max_workers = config.dispatch.max_workers,
            "configuration parsed and validated"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[imap]
server = "imap.example.com"
username = "alerts@example.com"
processed_folder = "processed"

[cctv_alerts]
email_sender = "dvr@example.com"
email_subject_filter = "Alarm"

[dvr]
host = "192.168.1.64"

[stream_capture]
storage_location = "/tmp/cctv"

[dispatch]
max_workers = 2

[dispatch.retry]
max_rounds = 3
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let cfg = result.unwrap();
        assert_eq!(cfg.imap.server, "imap.example.com");
        assert_eq!(cfg.dispatch.max_workers, 2);
        assert_eq!(cfg.dispatch.retry.max_rounds, 3);
        assert_eq!(cfg.dispatch.retry.max_backoff_ms, 30_000);
    }

    #[test]
    fn test_round_trip_toml() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.imap.server, cfg2.imap.server);
        assert_eq!(cfg.imap.processed_folder, cfg2.imap.processed_folder);
        assert_eq!(cfg.dispatch.retry.max_rounds, cfg2.dispatch.retry.max_rounds);
    }

    #[test]
    fn test_round_trip_json() {
        let cfg = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&cfg).unwrap();
        let cfg2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(cfg.dvr.host, cfg2.dvr.host);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = MINIMAL_TOML.replace("max_workers = 2", "max_workers = 0");
        let result = ConfigLoader::load_from_str(&content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_workers"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let content = MINIMAL_TOML.replace(
            "host = \"192.168.1.64\"",
            "host = \"192.168.1.64\"\ncamera_fps = 15",
        );
        let cfg = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.dvr.host, "192.168.1.64");
        assert_eq!(cfg.dvr.rtsp_port, 554);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let cfg = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(cfg.cctv_alerts.email_sender, "dvr@example.com");
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"), "got: {err}");
    }
}
