//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    imap_server: String,
    mailbox: String,
    processed_folder: Option<String>,
    alert_sender: String,
    dvr_host: String,
    storage_location: String,
    max_workers: usize,
    max_rounds: Option<u32>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    imap_server: config.imap.server.clone(),
                    mailbox: config.imap.mailbox.clone(),
                    processed_folder: config
                        .imap
                        .processed_folder_path(mailbox::source::FOLDER_DELIMITER),
                    alert_sender: config.cctv_alerts.email_sender.clone(),
                    dvr_host: config.dvr.host.clone(),
                    storage_location: config.stream_capture.storage_location.clone(),
                    max_workers: config.dispatch.max_workers,
                    max_rounds: (!config.dispatch.retry.is_unbounded())
                        .then_some(config.dispatch.retry.max_rounds),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::NotifierConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.imap.processed_folder.is_none() {
        if config.imap.unseen_only {
            warnings.push(
                "No processed folder configured - alert emails stay in the inbox".to_string(),
            );
        } else {
            warnings.push(
                "No processed folder configured and unseen_only is off - \
                 every poll will handle the same alerts again"
                    .to_string(),
            );
        }
    }

    if config.dispatch.retry.is_unbounded() {
        warnings.push(
            "dispatch.retry.max_rounds = 0 - a capture that never succeeds blocks polling forever"
                .to_string(),
        );
    }

    if config.cctv_alerts.email_subject_filter.is_empty() {
        warnings.push(
            "cctv_alerts.email_subject_filter is empty - every email from the sender is parsed"
                .to_string(),
        );
    }

    for env in [&config.imap.password_env, &config.dvr.password_env] {
        if config_loader::resolve_secret(env).is_err() {
            warnings.push(format!("Environment variable {env} is not set"));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Inbox: {} / {}", summary.imap_server, summary.mailbox);
            println!(
                "  Processed folder: {}",
                summary.processed_folder.as_deref().unwrap_or("(none)")
            );
            println!("  Alert sender: {}", summary.alert_sender);
            println!("  DVR: {}", summary.dvr_host);
            println!("  Storage: {}", summary.storage_location);
            println!("  Workers: {}", summary.max_workers);
            match summary.max_rounds {
                Some(rounds) => println!("  Max rounds: {rounds}"),
                None => println!("  Max rounds: unbounded"),
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
[imap]
server = "imap.example.com"
username = "alerts@example.com"
password_env = "CCTV_TEST_UNSET_IMAP_PASSWORD"

[cctv_alerts]
email_sender = "dvr@example.com"
email_subject_filter = "Alarm"

[dvr]
host = "192.168.1.64"
password_env = "CCTV_TEST_UNSET_DVR_PASSWORD"

[stream_capture]
storage_location = "/tmp/cctv"

[dispatch.retry]
max_rounds = 0
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config(CONFIG);
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: false,
        });

        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.max_rounds, None);
        assert_eq!(summary.processed_folder, None);

        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("No processed folder")));
        assert!(warnings.iter().any(|w| w.contains("max_rounds = 0")));
        assert!(warnings
            .iter()
            .any(|w| w.contains("CCTV_TEST_UNSET_DVR_PASSWORD")));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config(&CONFIG.replace("host = \"192.168.1.64\"", "host = \"\""));
        let result = validate_config(&ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("dvr.host"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/nonexistent/config.toml".into(),
            json: false,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
