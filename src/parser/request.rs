//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;

/// A parsed request head.
///
/// Header names are stored lowercased and cookies are derived from the
/// `cookie` header alone. Both maps are always present, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, with a trailing `/` already expanded to the index page
    pub path: String,
    /// The request line exactly as received, used for access logging
    pub request_line: String,
    /// The HTTP headers, keyed by lowercase name
    pub headers: HashMap<String, String>,
    /// Cookies sent in the `cookie` header
    pub cookies: HashMap<String, String>,
}

impl HttpRequest {
    /// Build a request from already-split parts.
    ///
    /// Header names are lowercased and the cookie map is derived from the
    /// resulting `cookie` entry.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        request_line: impl Into<String>,
        headers: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let cookies = headers
            .get("cookie")
            .map(|value| parse_cookies(value))
            .unwrap_or_default();

        Self {
            method,
            path: path.into(),
            request_line: request_line.into(),
            headers,
            cookies,
        }
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Get a cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Parse a request head from its request line and the header lines that follow.
///
/// `header_lines` must not include the terminating empty line. A trailing `/`
/// on the path is expanded with `index_page`.
///
/// # Errors
///
/// * [`Error::BadRequest`] if the request line has no path token
/// * [`Error::UnsupportedMethod`] if the method is not one of the six supported verbs
/// * [`Error::MalformedHeader`] if any header line lacks the `": "` delimiter
pub fn parse_request_head<S: AsRef<str>>(
    request_line: &str,
    header_lines: &[S],
    index_page: &str,
) -> Result<HttpRequest, Error> {
    let mut tokens = request_line.split(' ');
    let method = tokens.next().unwrap_or_default();
    let path = match tokens.next() {
        Some(path) if !path.is_empty() => path,
        _ => return Err(Error::BadRequest(request_line.to_string())),
    };
    let method = Method::from_str(method)?;

    let mut headers = HashMap::with_capacity(header_lines.len());
    for line in header_lines {
        let (name, value) = parse_header_line(line.as_ref())?;
        headers.insert(name, value);
    }

    Ok(HttpRequest::new(
        method,
        normalize_path(path, index_page),
        request_line,
        headers,
    ))
}

/// Parse a complete request head from raw bytes.
///
/// Lines may end in `\r\n` or `\n`; parsing stops at the first empty line.
pub fn parse_request(input: &[u8], index_page: &str) -> Result<HttpRequest, Error> {
    let text = String::from_utf8_lossy(input);
    let mut lines = text.lines().skip_while(|line| line.is_empty());

    let request_line = match lines.next() {
        Some(line) => line,
        None => return Err(Error::BadRequest(String::new())),
    };
    let header_lines: Vec<&str> = lines.take_while(|line| !line.is_empty()).collect();

    parse_request_head(request_line, &header_lines, index_page)
}

/// Split a header line on the first `": "` into a lowercase key and a value.
pub fn parse_header_line(line: &str) -> Result<(String, String), Error> {
    match line.split_once(": ") {
        Some((name, value)) => Ok((name.to_lowercase(), value.to_string())),
        None => Err(Error::MalformedHeader(line.to_string())),
    }
}

/// Parse a `cookie` header value into name/value pairs.
///
/// Pairs are separated by `"; "` and split on the first `=`. A pair without
/// `=` maps to an empty value.
pub fn parse_cookies(value: &str) -> HashMap<String, String> {
    value
        .split("; ")
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Append the index page to a path that names a directory.
pub fn normalize_path(path: &str, index_page: &str) -> String {
    if path.ends_with('/') {
        format!("{path}{index_page}")
    } else {
        path.to_string()
    }
}
