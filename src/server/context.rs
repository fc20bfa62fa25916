//! State shared by every connection.

use crate::logging::ServerLog;
use crate::server::config::ServerConfig;
use crate::server::registry::ServletRegistry;
use crate::server::response::ResponsePolicy;

/// Server-wide, read-only state handed to each connection session.
pub struct ServerContext {
    pub config: ServerConfig,
    pub policy: ResponsePolicy,
    pub registry: ServletRegistry,
    pub log: ServerLog,
}

impl ServerContext {
    pub fn new(config: ServerConfig, registry: ServletRegistry, log: ServerLog) -> Self {
        let policy = config.response_policy();
        Self {
            config,
            policy,
            registry,
            log,
        }
    }
}
