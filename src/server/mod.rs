//! HTTP server implementation.
//!
//! The [`HttpServer`] accepts connections and spawns a [`ConnectionSession`]
//! for each. Sessions dispatch requests to servlets from the
//! [`ServletRegistry`] or serve static files from the web root.

mod status;
mod response;
mod config;
mod context;
mod error;
mod handler;
mod registry;
mod session;
mod http_server;

// Re-export public items
pub use status::StatusCode;
pub use response::{build_set_cookie, error_page_html, HttpResponse, RenderedResponse, ResponsePolicy, DEFAULT_CONTENT_TYPE};
pub use config::{ServerConfig, DEFAULT_MAX_HEAD_SIZE};
pub use context::ServerContext;
pub use error::Error;
pub use handler::{method_not_allowed, Responder, Servlet, ServletFuture};
pub use registry::ServletRegistry;
pub use session::{keep_alive_timeout, read_static_file, resolve_static_path, status_for_parse_error, ConnectionSession};
pub use http_server::HttpServer;
