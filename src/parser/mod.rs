//! HTTP request parser.
//!
//! Turns a request line and its header lines into an [`HttpRequest`]. The
//! connection session does the line framing; everything here is pure.

mod request;
mod method;
mod error;
mod tests;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use error::Error;

pub use request::{normalize_path, parse_cookies, parse_header_line, parse_request, parse_request_head};
