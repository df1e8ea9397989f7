//! Error types for configuration and the spreadsheets API.

use gapi_bootstrap::BootstrapError;
use thiserror::Error;

/// Configuration error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Required setting is empty
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Spreadsheets API error type.
#[derive(Error, Debug)]
pub enum SheetsError {
    /// The library rejected the request
    #[error("Spreadsheets request failed: {0}")]
    Request(String),

    /// The response carried no `spreadsheetId`
    #[error("Spreadsheet response has no spreadsheetId")]
    MissingId,

    /// Encoding a request body failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client library is not available
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// Result type alias using SheetsError.
pub type SheetsResult<T> = Result<T, SheetsError>;
