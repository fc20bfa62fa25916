//! The accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::server::context::ServerContext;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, ResponsePolicy};
use crate::server::session::ConnectionSession;
use crate::server::status::StatusCode;

/// An HTTP server bound to its listening socket.
pub struct HttpServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
    limiter: Option<Arc<Semaphore>>,
}

impl HttpServer {
    /// Bind the listening socket to the configured address.
    pub async fn bind(context: ServerContext) -> Result<Self, Error> {
        let listener = TcpListener::bind(context.config.addr).await?;
        let limiter = context
            .config
            .max_connections
            .map(|n| Arc::new(Semaphore::new(n)));

        Ok(Self {
            listener,
            context: Arc::new(context),
            limiter,
        })
    }

    /// The address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Display the listening address and registered servlets.
    fn display_server_info(&self) {
        let config = &self.context.config;
        let log = &self.context.log;
        log.info(
            "",
            format!(
                "HTTP server started {}using {} connections",
                if config.debug { "IN DEBUG MODE " } else { "" },
                if config.persistent { "persistent" } else { "non-persistent" },
            ),
        );
        match self.local_addr() {
            Ok(addr) => log.info("", format!("Listening for requests on http://{addr}")),
            Err(e) => log.warn("", format!("Listening on an unknown address: {e}")),
        }
        for path in self.context.registry.paths() {
            log.info("", format!("  servlet {path}"));
        }
    }

    /// Accept connections forever, one task per connection.
    pub async fn run(self) -> Result<(), Error> {
        self.display_server_info();

        loop {
            match self.listener.accept().await {
                Ok((socket, addr)) => self.handle_new_connection(socket, addr).await,
                Err(e) => {
                    self.context.log.warn("", format!("Error accepting connection: {e}"));
                    // Back off so a persistent failure (e.g. out of descriptors) cannot spin.
                    tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
                }
            }
        }
    }

    /// Hand an accepted socket to its own session task.
    async fn handle_new_connection(&self, mut socket: TcpStream, addr: SocketAddr) {
        let client = addr.ip().to_string();

        let permit = match &self.limiter {
            Some(limiter) => match Arc::clone(limiter).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.context
                        .log
                        .warn(&client, "Connection limit reached, rejecting connection");
                    let policy = ResponsePolicy {
                        persistent: false,
                        ..self.context.policy.clone()
                    };
                    let response = HttpResponse::error_page(StatusCode::ServiceUnavailable).render(&policy);
                    if let Err(e) = socket.write_all(&response.to_bytes()).await {
                        self.context.log.verbose(&client, format!("Error sending rejection: {e}"));
                    }
                    if let Err(e) = socket.shutdown().await {
                        self.context.log.verbose(&client, format!("Error shutting down connection: {e}"));
                    }
                    return;
                }
            },
            None => None,
        };

        if self.context.config.debug {
            self.context.log.debug(&client, "Connection established with client");
        }

        let session = ConnectionSession::new(socket, client, Arc::clone(&self.context));
        tokio::spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;
            session.run().await;
        });
    }
}
