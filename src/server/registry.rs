//! Exact-path servlet registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::server::handler::Servlet;

/// Maps exact request paths to servlets.
///
/// Filled in before the server starts and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ServletRegistry {
    servlets: HashMap<String, Arc<dyn Servlet>>,
}

impl ServletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a servlet under every path it declares.
    ///
    /// A path that is already taken is reassigned to the new servlet.
    pub fn register(&mut self, servlet: Arc<dyn Servlet>) {
        for path in servlet.paths() {
            if self.servlets.insert(path.clone(), Arc::clone(&servlet)).is_some() {
                warn!("Servlet path {path} registered twice, keeping the latest");
            }
        }
    }

    /// Look up the servlet for an exact path.
    pub fn lookup(&self, path: &str) -> Option<Arc<dyn Servlet>> {
        self.servlets.get(path).cloned()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.servlets.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.servlets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servlets.is_empty()
    }
}

impl fmt::Debug for ServletRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServletRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}
