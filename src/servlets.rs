//! Built-in servlets, registered by name from the `servlets` config list.
//!
//! * `visits` serves `/visits.html` from the web root, counting visits in a
//!   `visits` cookie and filling in `%%visits%%`.
//! * `server-info` reports the server settings as JSON at `/server-info`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use log::warn;
use serde::Serialize;

use crate::parser::HttpRequest;
use crate::server::{
    read_static_file, Error, HttpResponse, Responder, ServerConfig, Servlet, ServletFuture,
    ServletRegistry, StatusCode,
};
use crate::template::render_template;

/// Build the registry from the servlet names in the configuration.
///
/// Unknown names are skipped with a warning.
pub fn registry_from_config(config: &ServerConfig) -> ServletRegistry {
    let mut registry = ServletRegistry::new();
    for name in &config.servlets {
        match builtin(name, config) {
            Some(servlet) => registry.register(servlet),
            None => warn!("Unknown servlet '{name}' in configuration, skipping"),
        }
    }
    registry
}

/// Look up a built-in servlet by its config name.
pub fn builtin(name: &str, config: &ServerConfig) -> Option<Arc<dyn Servlet>> {
    match name {
        "visits" => Some(Arc::new(VisitCounter::new(config.web_root.clone()))),
        "server-info" => Some(Arc::new(ServerInfo::from_config(config))),
        _ => None,
    }
}

/// Counts a client's visits with a cookie and renders them into a page.
pub struct VisitCounter {
    web_root: PathBuf,
}

impl VisitCounter {
    pub const PATH: &'static str = "/visits.html";
    const COOKIE: &'static str = "visits";

    pub fn new(web_root: PathBuf) -> Self {
        Self { web_root }
    }

    fn visit_count(request: &HttpRequest) -> u64 {
        request
            .cookie(Self::COOKIE)
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(1, |n| n.saturating_add(1))
    }
}

impl Servlet for VisitCounter {
    fn paths(&self) -> Vec<String> {
        vec![Self::PATH.to_string()]
    }

    fn get<'a>(&'a self, out: &'a mut dyn Responder, request: &'a HttpRequest) -> ServletFuture<'a> {
        Box::pin(async move {
            let page = match read_static_file(&self.web_root, Self::PATH).await {
                Ok(page) => page,
                Err(Error::NotFound(_)) => {
                    return out.send_response(HttpResponse::error_page(StatusCode::NotFound)).await;
                }
                Err(e) => return Err(e),
            };

            let visits = Self::visit_count(request);
            let symbols = HashMap::from([(Self::COOKIE, visits.to_string())]);
            let body = render_template(&String::from_utf8_lossy(&page), &symbols);

            let response = HttpResponse::new(StatusCode::Ok)
                .with_cookie(Self::COOKIE, &visits.to_string(), &["Path=/"])
                .with_body_string(body);
            out.send_response(response).await
        })
    }
}

/// Reports server settings as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    version: String,
    persistent_connections: bool,
    persistent_connection_timeout_ms: u64,
    index_page: String,
    servlets: Vec<String>,
}

impl ServerInfo {
    pub const PATH: &'static str = "/server-info";

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            version: config.server_version.clone(),
            persistent_connections: config.persistent,
            persistent_connection_timeout_ms: config.persistent_timeout.as_millis() as u64,
            index_page: config.index_page.clone(),
            servlets: config.servlets.clone(),
        }
    }
}

impl Servlet for ServerInfo {
    fn paths(&self) -> Vec<String> {
        vec![Self::PATH.to_string()]
    }

    fn get<'a>(&'a self, out: &'a mut dyn Responder, _request: &'a HttpRequest) -> ServletFuture<'a> {
        Box::pin(async move {
            let response = HttpResponse::new(StatusCode::Ok).with_json(self)?;
            out.send_response(response).await
        })
    }
}
