//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Config, ConfigError};
use crate::logging::LogConfig;
use crate::server::response::ResponsePolicy;

/// Default cap on request head bytes.
pub const DEFAULT_MAX_HEAD_SIZE: usize = 8192;

/// HTTP server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to.
    pub addr: SocketAddr,
    /// Log every level and dump request headers.
    pub debug: bool,
    /// Keep connections open between requests.
    pub persistent: bool,
    /// Initial idle timeout for reading a request; zero waits forever.
    pub persistent_timeout: Duration,
    /// Upper bound on the bytes of one request head.
    pub max_head_size: usize,
    /// Directory static files are served from.
    pub web_root: PathBuf,
    /// File name appended to paths ending in `/`.
    pub index_page: String,
    /// Version reported in the `Server` header.
    pub server_version: String,
    /// Upper bound on concurrent connections; `None` is unbounded.
    pub max_connections: Option<usize>,
    /// Names of built-in servlets to register.
    pub servlets: Vec<String>,
    /// File logging settings.
    pub logging: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            debug: false,
            persistent: true,
            persistent_timeout: Duration::from_millis(6000),
            max_head_size: DEFAULT_MAX_HEAD_SIZE,
            web_root: PathBuf::from("."),
            index_page: "index.html".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            max_connections: None,
            servlets: Vec::new(),
            logging: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Resolve the server settings from a loaded configuration.
    ///
    /// `server-version` and `files.web-root` are required; everything else
    /// has a default.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let persistence = config.section_or_empty("persistence");
        let files = config.section("files")?;

        let bind_address = config.get_string_or("bind-address", "0.0.0.0");
        let port = config.get_int_or("port", 80);
        let port = u16::try_from(port).map_err(|_| ConfigError::Invalid {
            key: "port".to_string(),
            reason: format!("{port} is not a TCP port"),
        })?;
        let addr = format!("{bind_address}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "bind-address".to_string(),
                reason: format!("{bind_address}: {e}"),
            })?;

        let timeout_ms = persistence.get_int_or("persistent-connection-timeout", 6000);
        let timeout_ms = u64::try_from(timeout_ms).map_err(|_| ConfigError::Invalid {
            key: "persistent-connection-timeout".to_string(),
            reason: "must not be negative".to_string(),
        })?;

        let max_head_size = config.get_int_or("max-request-head-size", DEFAULT_MAX_HEAD_SIZE as i64);
        let max_head_size = usize::try_from(max_head_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::Invalid {
                key: "max-request-head-size".to_string(),
                reason: format!("{max_head_size} is not a positive byte count"),
            })?;

        let max_connections = match config.get_int_or("max-connections", 0) {
            n if n <= 0 => None,
            n => Some(n as usize),
        };

        Ok(Self {
            addr,
            debug: config.get_bool_or("debug", false),
            persistent: persistence.get_bool_or("use-persistent-connections", false),
            persistent_timeout: Duration::from_millis(timeout_ms),
            max_head_size,
            web_root: PathBuf::from(files.get_string("web-root")?),
            index_page: config.get_string_or("index-page", "index.html"),
            server_version: config.get_string("server-version")?,
            max_connections,
            servlets: config.get_string_list_or("servlets", Vec::new()),
            logging: LogConfig::from_config(&config.section_or_empty("logging")),
        })
    }

    /// The header policy every response on this server follows.
    pub fn response_policy(&self) -> ResponsePolicy {
        ResponsePolicy::new(&self.server_version, self.persistent)
    }
}
