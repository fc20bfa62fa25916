//! Error types for the HTTP request parser.

use thiserror::Error;

/// Errors that can occur while parsing a request head.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The request line is missing its method or path token.
    #[error("Bad request line: {0}")]
    BadRequest(String),

    /// The request method is not one of the supported verbs.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A header line has no `": "` delimiter between key and value.
    #[error("Malformed header line: {0}")]
    MalformedHeader(String),
}
