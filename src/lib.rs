//! A minimal HTTP/1.1 server with servlets, static files and keep-alive.
//!
//! Requests are parsed line by line, routed by exact path to a registered
//! [`Servlet`] or served from the web root, and answered with a fully rendered
//! response. Persistent connections honour the client's `Keep-Alive: timeout=`
//! hint.
//!
//! # Features
//!
//! - Request head parsing with lowercase header names and cookie extraction
//! - GET, HEAD, POST, PUT, PATCH and DELETE dispatch to servlets
//! - Static file serving with index page expansion and generated error pages
//! - Persistent connections with per-request read timeout renegotiation
//! - YAML configuration, leveled error log and access log with rotation
//!
//! # Examples
//!
//! ## Parsing a request head
//!
//! ```
//! use servlet_httpd::{parse_request_head, Method};
//!
//! let request = parse_request_head(
//!     "GET /docs/ HTTP/1.1",
//!     &["Host: example.com", "Cookie: visits=2; theme=dark"],
//!     "index.html",
//! ).unwrap();
//!
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/docs/index.html");
//! assert_eq!(request.header("host"), Some("example.com"));
//! assert_eq!(request.cookie("visits"), Some("2"));
//! ```
//!
//! ## Rendering a response
//!
//! ```
//! use servlet_httpd::{HttpResponse, ResponsePolicy, StatusCode};
//!
//! let policy = ResponsePolicy::new("1.0", false);
//! let response = HttpResponse::new(StatusCode::Ok)
//!     .with_cookie("visits", "3", &["Path=/"])
//!     .with_body_string("<h1>hi</h1>")
//!     .render(&policy);
//!
//! assert!(response.header_block().starts_with("HTTP/1.1 200 OK\r\n"));
//! assert!(response.header_block().contains("Connection: close\r\n"));
//! assert!(response.header_block().contains("Set-Cookie: visits=3; Path=/\r\n"));
//! assert_eq!(response.body(), b"<h1>hi</h1>");
//! ```
//!
//! ## Writing a servlet
//!
//! ```
//! use servlet_httpd::{HttpRequest, HttpResponse, Responder, Servlet, ServletFuture, StatusCode};
//!
//! struct Hello;
//!
//! impl Servlet for Hello {
//!     fn paths(&self) -> Vec<String> {
//!         vec!["/hello".to_string()]
//!     }
//!
//!     fn get<'a>(&'a self, out: &'a mut dyn Responder, _req: &'a HttpRequest) -> ServletFuture<'a> {
//!         Box::pin(async move {
//!             out.send_response(HttpResponse::new(StatusCode::Ok).with_body_string("hello")).await
//!         })
//!     }
//! }
//! ```

pub mod config;
pub mod logging;
pub mod parser;
pub mod server;
pub mod servlets;
pub mod template;

// Re-export commonly used items for convenience
pub use config::{Config, ConfigError};
pub use logging::{LogConfig, ServerLog, Severity};
pub use parser::{parse_request, parse_request_head, Error as ParserError, HttpRequest, Method};
pub use server::{
    ConnectionSession, Error as ServerError, HttpResponse, HttpServer, RenderedResponse, Responder,
    ResponsePolicy, ServerConfig, ServerContext, Servlet, ServletFuture, ServletRegistry, StatusCode,
};
