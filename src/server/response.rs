//! HTTP response building and rendering.
//!
//! [`HttpResponse`] is assembled by value and then rendered once into a
//! [`RenderedResponse`], whose header block and body are written to the wire
//! separately.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::server::error::Error;
use crate::server::status::StatusCode;

/// Content type used for static files and generated pages.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html";

const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Server-wide settings that shape every response header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePolicy {
    /// Value of the `Server` header
    pub server_name: String,
    /// Whether connections are kept open between requests
    pub persistent: bool,
}

impl ResponsePolicy {
    pub fn new(server_version: &str, persistent: bool) -> Self {
        Self {
            server_name: format!("servlet-httpd v{server_version}"),
            persistent,
        }
    }
}

/// An HTTP response that has not been rendered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// The `Content-type` header value
    pub content_type: String,
    /// Complete header lines appended after the mandatory headers
    pub extra_headers: Vec<String>,
    /// The response body; `None` renders the status error page
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    /// Create a response with the given status and no body yet.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            extra_headers: Vec::new(),
            body: None,
        }
    }

    /// A response whose body is the generated error page for `status`.
    pub fn error_page(status: StatusCode) -> Self {
        Self::new(status)
    }

    /// Set the response body with a string.
    pub fn with_body_string(self, body: impl Into<String>) -> Self {
        self.with_body_bytes(body.into().into_bytes())
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Append a complete header line such as `Allow: GET`.
    pub fn with_extra_header(mut self, line: impl Into<String>) -> Self {
        self.extra_headers.push(line.into());
        self
    }

    /// Append a `Set-Cookie` header.
    pub fn with_cookie(self, name: &str, value: &str, attributes: &[&str]) -> Self {
        self.with_extra_header(build_set_cookie(name, value, attributes))
    }

    /// Set the response body with a JSON value.
    ///
    /// This method serializes the provided value to JSON and sets it as the response body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self
            .with_content_type("application/json")
            .with_body_bytes(json))
    }

    /// Render with the current time in the `Date` header.
    pub fn render(self, policy: &ResponsePolicy) -> RenderedResponse {
        self.render_at(policy, Utc::now())
    }

    /// Render with an explicit `Date`.
    pub fn render_at(self, policy: &ResponsePolicy, date: DateTime<Utc>) -> RenderedResponse {
        let (content_type, body) = match self.body {
            Some(body) => (self.content_type, body),
            None => (
                DEFAULT_CONTENT_TYPE.to_string(),
                error_page_html(self.status).into_bytes(),
            ),
        };

        let mut header_block = format!(
            "HTTP/1.1 {code} {reason}\r\n\
             Server: {server}\r\n\
             Date: {date}\r\n\
             Content-type: {content_type}\r\n\
             Content-length: {length}\r\n",
            code = self.status.code(),
            reason = self.status.reason_phrase(),
            server = policy.server_name,
            date = date.format(DATE_FORMAT),
            length = body.len(),
        );
        if !policy.persistent {
            header_block.push_str("Connection: close\r\n");
        }
        for line in &self.extra_headers {
            header_block.push_str(line);
            header_block.push_str("\r\n");
        }
        header_block.push_str("\r\n");

        RenderedResponse {
            status: self.status,
            header_block,
            body,
        }
    }
}

/// A response ready for the wire. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    status: StatusCode,
    header_block: String,
    body: Vec<u8>,
}

impl RenderedResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status line and headers, ending with the blank line.
    pub fn header_block(&self) -> &str {
        &self.header_block
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert the response to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header_block.len() + self.body.len());
        bytes.extend_from_slice(self.header_block.as_bytes());
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

/// The minimal HTML page sent for a status with no explicit body.
pub fn error_page_html(status: StatusCode) -> String {
    let reason = status.reason_phrase();
    format!(
        "<!DOCTYPE html><html><head><title>{reason}</title></head>\
         <body><h1>{reason}</h1></body></html>"
    )
}

/// Build a `Set-Cookie` header line: `Set-Cookie: name=value[; attr]*`.
pub fn build_set_cookie(name: &str, value: &str, attributes: &[&str]) -> String {
    let mut cookie = format!("Set-Cookie: {name}={value}");
    for attribute in attributes {
        cookie.push_str("; ");
        cookie.push_str(attribute);
    }
    cookie
}
