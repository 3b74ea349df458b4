//! Error types for the harvester.
//!
//! Only transport and configuration problems surface as errors. Records with
//! poor data quality are excluded or degraded at the adapter boundary and
//! never reach this type.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry answered with a non-success status.
    #[error("Registry request to {url} failed with status {status}")]
    RegistryStatus { url: String, status: u16 },

    /// Repository database query or connection failed.
    #[error("Database error: {0}")]
    Database(#[from] postgres::Error),

    /// Registry response body was not the expected JSON shape.
    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration parsing failed: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    /// Configuration value missing or invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Resumption cursor could not be decoded.
    #[error("Invalid cursor: '{0}'")]
    InvalidCursor(String),

    /// Timestamp could not be parsed.
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// XML document could not be written.
    #[error("XML serialization failed: {0}")]
    XmlWrite(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvesterError {
    /// Whether this error came from talking to a backend.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RegistryStatus { .. } | Self::Database(_)
        )
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
