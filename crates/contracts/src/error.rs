//! Layered error definitions
//!
//! Categorized by source: config / secret / message / mailbox / capture

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Secret not present in the environment
    #[error("secret '{name}' is not set or empty")]
    MissingSecret { name: String },

    // ===== Event Source Errors =====
    /// Alert email body could not be parsed
    #[error("message {uid} parse error: {message}")]
    MessageParse { uid: u32, message: String },

    /// Mailbox access error
    #[error("mailbox '{source_name}' error: {message}")]
    Mailbox {
        source_name: String,
        message: String,
    },

    // ===== Capture Errors =====
    /// Capture setup error (not a per-event failure)
    #[error("capture error for camera {camera_id}: {message}")]
    Capture { camera_id: u32, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing secret error
    pub fn missing_secret(name: impl Into<String>) -> Self {
        Self::MissingSecret { name: name.into() }
    }

    /// Create mailbox error
    pub fn mailbox(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mailbox {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
