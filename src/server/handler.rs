//! The servlet capability and the connection side it writes to.

use std::future::Future;
use std::pin::Pin;

use crate::parser::{HttpRequest, Method};
use crate::server::error::Error;
use crate::server::response::HttpResponse;
use crate::server::status::StatusCode;

/// Type alias for the boxed future every servlet operation returns.
pub type ServletFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// Where a servlet sends its response.
///
/// Implemented by the connection session; tests may provide their own.
pub trait Responder: Send {
    /// Render and write a response, then record it in the access log.
    fn send_response(&mut self, response: HttpResponse) -> ServletFuture<'_>;

    /// Address of the connected client.
    fn client_ip(&self) -> &str;
}

/// A handler bound to one or more exact request paths.
///
/// Each operation writes its response through the [`Responder`]. Operations
/// that are not overridden answer `405 Method Not Allowed`.
pub trait Servlet: Send + Sync {
    /// The exact paths this servlet serves.
    fn paths(&self) -> Vec<String>;

    fn get<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    fn head<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    fn post<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    fn put<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    fn patch<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    fn delete<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        method_not_allowed(out)
    }

    /// Route a request to the operation for its method.
    fn service<'a>(&'a self, out: &'a mut dyn Responder, request: &'a HttpRequest) -> ServletFuture<'a> {
        match request.method {
            Method::GET => self.get(out, request),
            Method::HEAD => self.head(out, request),
            Method::POST => self.post(out, request),
            Method::PUT => self.put(out, request),
            Method::PATCH => self.patch(out, request),
            Method::DELETE => self.delete(out, request),
        }
    }
}

/// Send the `405 Method Not Allowed` error page.
pub fn method_not_allowed(out: &mut dyn Responder) -> ServletFuture<'_> {
    out.send_response(HttpResponse::error_page(StatusCode::MethodNotAllowed))
}
