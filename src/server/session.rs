//! Per-connection request loop.
//!
//! A [`ConnectionSession`] owns one accepted stream. It reads a request head,
//! parses it, dispatches to a servlet or the static file responder, writes the
//! response and then either waits for the next request (persistent mode) or
//! closes. Timeouts and transport errors end the session without a response.
//! A request head larger than the configured limit is answered with 413 and
//! the connection is closed.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

use crate::logging::ServerLog;
use crate::parser::{parse_request_head, Error as ParserError, HttpRequest, Method};
use crate::server::context::ServerContext;
use crate::server::error::Error;
use crate::server::handler::{Responder, ServletFuture};
use crate::server::response::{HttpResponse, RenderedResponse, ResponsePolicy};
use crate::server::status::StatusCode;

/// One client connection.
pub struct ConnectionSession<S> {
    stream: BufReader<S>,
    client: String,
    read_timeout: Duration,
    context: Arc<ServerContext>,
    // Request line and host of the request being answered, for the access log.
    current: Option<(String, String)>,
}

impl<S> ConnectionSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, client: impl Into<String>, context: Arc<ServerContext>) -> Self {
        let read_timeout = context.config.persistent_timeout;
        Self {
            stream: BufReader::new(stream),
            client: client.into(),
            read_timeout,
            context,
            current: None,
        }
    }

    /// The deadline currently applied to each line read. Zero means none.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    fn log(&self) -> &ServerLog {
        &self.context.log
    }

    /// Serve requests until the connection closes.
    pub async fn run(mut self) {
        loop {
            match self.serve_next().await {
                Ok(true) if self.context.config.persistent => continue,
                Ok(true) => {
                    self.log().verbose(&self.client, "Connection with a client closed (non-persistent)");
                    break;
                }
                Ok(false) => {
                    self.log().verbose(&self.client, "Client closed the connection");
                    break;
                }
                Err(Error::Timeout) => {
                    self.log().verbose(&self.client, "Connection with a client timed out and was closed");
                    break;
                }
                Err(Error::HeadTooLarge(_)) => {
                    self.log().verbose(&self.client, "Connection closed after an oversized request");
                    break;
                }
                Err(Error::IoError(e)) => {
                    self.log().verbose(&self.client, format!("Connection closed after I/O error: {e}"));
                    break;
                }
                Err(e) => {
                    self.log().severe(&self.client, format!("Connection aborted: {e}"));
                    break;
                }
            }
        }

        if let Err(e) = self.stream.get_mut().shutdown().await {
            self.log().verbose(&self.client, format!("Error shutting down connection: {e}"));
        }
    }

    /// Run one read/parse/dispatch/respond cycle.
    ///
    /// Returns `Ok(false)` if the client closed the connection before sending
    /// a request.
    pub(crate) async fn serve_next(&mut self) -> Result<bool, Error> {
        self.current = None;
        let lines = match self.read_head().await {
            Ok(Some(lines)) => lines,
            Ok(None) => return Ok(false),
            Err(Error::HeadTooLarge(limit)) => {
                self.log().info(&self.client, format!("Rejected request head over {limit} bytes"));
                let policy = ResponsePolicy {
                    persistent: false,
                    ..self.context.policy.clone()
                };
                let rendered = HttpResponse::error_page(StatusCode::RequestEntityTooLarge).render(&policy);
                self.write_rendered(rendered).await?;
                return Err(Error::HeadTooLarge(limit));
            }
            Err(e) => return Err(e),
        };

        self.log().verbose(&self.client, "Request received from client");
        if self.log().is_debugging() {
            self.log().debug(&self.client, "RECEIVED HEADERS");
            for line in &lines {
                self.log().debug(&self.client, line);
            }
        }

        let (request_line, header_lines) = lines
            .split_first()
            .ok_or_else(|| Error::InternalError("empty request head".to_string()))?;
        self.current = Some((request_line.clone(), "-".to_string()));

        let request = match parse_request_head(request_line, header_lines, &self.context.config.index_page) {
            Ok(request) => request,
            Err(e) => {
                self.log().info(&self.client, format!("Rejected request: {e}"));
                let response = HttpResponse::error_page(status_for_parse_error(&e));
                self.write_response(response).await?;
                return Ok(true);
            }
        };

        if let Some(host) = request.header("host") {
            self.current = Some((request.request_line.clone(), host.to_string()));
        }
        self.renegotiate_timeout(&request);
        self.dispatch(&request).await?;
        Ok(true)
    }

    /// Read lines up to the blank line ending a request head.
    ///
    /// Blank lines before the request line are skipped. `Ok(None)` means the
    /// client closed the connection between requests.
    async fn read_head(&mut self) -> Result<Option<Vec<String>>, Error> {
        let limit = self.context.config.max_head_size;
        let mut consumed = 0;
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            let remaining = limit.saturating_sub(consumed);
            if remaining == 0 {
                return Err(Error::HeadTooLarge(limit));
            }

            buf.clear();
            let n = self.read_line(&mut buf, remaining).await?;
            if n == 0 {
                if lines.is_empty() {
                    return Ok(None);
                }
                return Err(Error::IoError(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-request",
                )));
            }
            consumed += n;
            if n == remaining && !buf.ends_with(b"\n") {
                return Err(Error::HeadTooLarge(limit));
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
            if line.is_empty() {
                if lines.is_empty() {
                    continue;
                }
                return Ok(Some(lines));
            }
            lines.push(line.to_string());
        }
    }

    /// Read one line of at most `limit` bytes under the current read timeout.
    async fn read_line(&mut self, buf: &mut Vec<u8>, limit: usize) -> Result<usize, Error> {
        let read_timeout = self.read_timeout;
        let mut limited = (&mut self.stream).take(limit as u64);
        let read = limited.read_until(b'\n', buf);

        if read_timeout.is_zero() {
            return Ok(read.await?);
        }
        match timeout(read_timeout, read).await {
            Ok(read) => Ok(read?),
            Err(_) => Err(Error::Timeout),
        }
    }

    fn renegotiate_timeout(&mut self, request: &HttpRequest) {
        if !self.context.config.persistent {
            return;
        }
        let Some(value) = request.header("keep-alive") else {
            return;
        };

        match keep_alive_timeout(value) {
            Some(read_timeout) => {
                self.read_timeout = read_timeout;
                self.log().debug(
                    &self.client,
                    format!("Read timeout set to {} ms", read_timeout.as_millis()),
                );
            }
            None => self.log().verbose(&self.client, "Malformed headers received"),
        }
    }

    async fn dispatch(&mut self, request: &HttpRequest) -> Result<(), Error> {
        if let Some(servlet) = self.context.registry.lookup(&request.path) {
            let result = servlet.service(self, request).await;
            return match result {
                Err(e) if !e.is_transport() => {
                    self.log().severe(&self.client, format!("Servlet for {} failed: {e}", request.path));
                    self.write_response(HttpResponse::error_page(StatusCode::InternalServerError))
                        .await
                }
                result => result,
            };
        }

        match request.method {
            Method::GET => self.serve_static(request).await,
            method => {
                self.log().info(&self.client, format!("No servlet for {method} {}", request.path));
                let response = HttpResponse::error_page(StatusCode::MethodNotAllowed)
                    .with_extra_header("Allow: GET");
                self.write_response(response).await
            }
        }
    }

    async fn serve_static(&mut self, request: &HttpRequest) -> Result<(), Error> {
        let response = match read_static_file(&self.context.config.web_root, &request.path).await {
            Ok(bytes) => HttpResponse::new(StatusCode::Ok).with_body_bytes(bytes),
            Err(Error::NotFound(path)) => {
                self.log().verbose(&self.client, format!("File not found: {path}"));
                HttpResponse::error_page(StatusCode::NotFound)
            }
            Err(e) => {
                self.log().severe(&self.client, format!("Failed to read {}: {e}", request.path));
                HttpResponse::error_page(StatusCode::InternalServerError)
            }
        };
        self.write_response(response).await
    }

    /// Render a response and write it: header block first, then the body,
    /// each flushed on its own.
    pub async fn write_response(&mut self, response: HttpResponse) -> Result<(), Error> {
        let rendered = response.render(&self.context.policy);
        self.write_rendered(rendered).await
    }

    async fn write_rendered(&mut self, rendered: RenderedResponse) -> Result<(), Error> {
        if self.log().is_debugging() {
            self.log().debug(&self.client, format!("SENDING HEADERS\n{}", rendered.header_block()));
        }

        let stream = self.stream.get_mut();
        stream.write_all(rendered.header_block().as_bytes()).await?;
        stream.flush().await?;
        stream.write_all(rendered.body()).await?;
        stream.flush().await?;

        let (request_line, host) = self
            .current
            .as_ref()
            .map(|(line, host)| (line.as_str(), host.as_str()))
            .unwrap_or(("-", "-"));
        self.log()
            .http_access_log(&self.client, host, request_line, rendered.status().code());
        Ok(())
    }
}

impl<S> Responder for ConnectionSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn send_response(&mut self, response: HttpResponse) -> ServletFuture<'_> {
        Box::pin(self.write_response(response))
    }

    fn client_ip(&self) -> &str {
        &self.client
    }
}

/// The error page status for a request that failed to parse.
pub fn status_for_parse_error(error: &ParserError) -> StatusCode {
    match error {
        ParserError::BadRequest(_) | ParserError::MalformedHeader(_) => StatusCode::BadRequest,
        ParserError::UnsupportedMethod(_) => StatusCode::MethodNotAllowed,
    }
}

/// Extract the timeout from a `keep-alive: timeout=<n>[,...]` header value.
///
/// Returns `None` when there is no usable positive number of seconds.
pub fn keep_alive_timeout(value: &str) -> Option<Duration> {
    value
        .split(',')
        .filter_map(|attr| attr.trim().split_once('='))
        .find(|(key, _)| *key == "timeout")
        .and_then(|(_, secs)| secs.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Map a request path onto the web root.
///
/// Any query string is ignored. Paths that would leave the web root resolve
/// to `None`.
pub fn resolve_static_path(web_root: &Path, request_path: &str) -> Option<PathBuf> {
    let path = request_path.split('?').next().unwrap_or_default();
    let relative = Path::new(path.trim_start_matches('/'));
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        None
    } else {
        Some(web_root.join(relative))
    }
}

/// Read a static file from under the web root.
pub async fn read_static_file(web_root: &Path, request_path: &str) -> Result<Vec<u8>, Error> {
    let not_found = || Error::NotFound(request_path.to_string());
    let path = resolve_static_path(web_root, request_path).ok_or_else(not_found)?;

    // Any failed lookup (missing, not a directory, name too long) is absent.
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(fs::read(&path).await?),
        _ => Err(not_found()),
    }
}
