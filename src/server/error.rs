//! Error types for the HTTP server.

use thiserror::Error;

use crate::config::ConfigError;
use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// No request line arrived before the read timeout.
    #[error("Connection timed out")]
    Timeout,

    /// The request head grew past the configured limit.
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Requested resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or mistyped configuration.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl Error {
    /// Whether the error came from the transport rather than the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Timeout | Error::IoError(_))
    }
}
