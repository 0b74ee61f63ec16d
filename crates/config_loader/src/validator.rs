//! Configuration validation
//!
//! Rules:
//! - required hosts, user names, sender and storage location are non-empty
//! - polling frequency and clip length > 0
//! - max_workers >= 1
//! - retry multiplier >= 1.0, max_backoff_ms >= initial_backoff_ms
//! - processed folder, when configured, is non-empty

use contracts::{ContractError, NotifierConfig};

/// Validate a NotifierConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &NotifierConfig) -> Result<(), ContractError> {
    validate_required_fields(config)?;
    validate_imap(config)?;
    validate_stream_capture(config)?;
    validate_dispatch(config)?;
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::config_validation(field, "cannot be empty"));
    }
    Ok(())
}

fn validate_required_fields(config: &NotifierConfig) -> Result<(), ContractError> {
    require_non_empty("imap.server", &config.imap.server)?;
    require_non_empty("imap.username", &config.imap.username)?;
    require_non_empty("imap.password_env", &config.imap.password_env)?;
    require_non_empty("cctv_alerts.email_sender", &config.cctv_alerts.email_sender)?;
    require_non_empty("dvr.host", &config.dvr.host)?;
    require_non_empty("dvr.password_env", &config.dvr.password_env)?;
    require_non_empty(
        "stream_capture.storage_location",
        &config.stream_capture.storage_location,
    )?;
    Ok(())
}

fn validate_imap(config: &NotifierConfig) -> Result<(), ContractError> {
    if config.imap.polling_frequency_secs == 0 {
        return Err(ContractError::config_validation(
            "imap.polling_frequency_secs",
            "polling_frequency_secs must be > 0",
        ));
    }

    if let Some(folder) = &config.imap.processed_folder {
        require_non_empty("imap.processed_folder", folder)?;
    }

    Ok(())
}

fn validate_stream_capture(config: &NotifierConfig) -> Result<(), ContractError> {
    if config.stream_capture.detection_clip_length_secs == 0 {
        return Err(ContractError::config_validation(
            "stream_capture.detection_clip_length_secs",
            "detection_clip_length_secs must be > 0",
        ));
    }
    require_non_empty("stream_capture.ffmpeg_path", &config.stream_capture.ffmpeg_path)?;
    Ok(())
}

fn validate_dispatch(config: &NotifierConfig) -> Result<(), ContractError> {
    let dispatch = &config.dispatch;

    if dispatch.max_workers == 0 {
        return Err(ContractError::config_validation(
            "dispatch.max_workers",
            "max_workers must be >= 1",
        ));
    }

    let retry = &dispatch.retry;
    if !(retry.multiplier >= 1.0 && retry.multiplier.is_finite()) {
        return Err(ContractError::config_validation(
            "dispatch.retry.multiplier",
            format!("multiplier must be >= 1.0, got {}", retry.multiplier),
        ));
    }

    if retry.max_backoff_ms < retry.initial_backoff_ms {
        return Err(ContractError::config_validation(
            "dispatch.retry.initial_backoff_ms / dispatch.retry.max_backoff_ms",
            format!(
                "initial_backoff_ms ({}) must be <= max_backoff_ms ({})",
                retry.initial_backoff_ms, retry.max_backoff_ms
            ),
        ));
    }

    Ok(())
}
