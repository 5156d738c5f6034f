//! The HTTP server.
//!
//! Each accepted connection runs on its own task. A request is buffered,
//! turned into a Hermes [`Request`] and handed to the route table; the
//! table's response is written back as is.

use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use hermes_config::ServerConfig;
use hermes_core::{DispatchError, Rejection, Request, Response};
use hermes_router::{RequestHead, RouteTable};
use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

/// Serves one route table.
pub struct Server {
    table: Arc<RouteTable>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `table`.
    #[must_use]
    pub fn new(table: RouteTable, config: ServerConfig) -> Self {
        Self::from_shared(Arc::new(table), config)
    }

    /// Creates a server for a table that is shared elsewhere.
    #[must_use]
    pub fn from_shared(table: Arc<RouteTable>, config: ServerConfig) -> Self {
        Self { table, config }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr: SocketAddr = self.config.http_addr.parse().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr))
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("cannot bind {addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// waits up to the shutdown timeout for open connections.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, routes = self.table.len(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let connection = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.handle_connection(stream, shutdown).await {
                                tracing::debug!(remote = %remote, error = %e, "connection error");
                            }
                            drop(connection);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
                () = shutdown.recv() => break,
            }
        }

        let timeout = Duration::from_secs(server.config.shutdown_timeout_secs);
        tracing::info!(
            open_connections = tracker.active_connections(),
            timeout_secs = timeout.as_secs(),
            "server shutting down"
        );
        if tokio::time::timeout(timeout, tracker.drained()).await.is_err() {
            tracing::warn!(
                open_connections = tracker.active_connections(),
                "shutdown timeout reached"
            );
        }
        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle_request(request).await) }
        });

        let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(connection);
        tokio::select! {
            result = connection.as_mut() => result,
            () = shutdown.recv() => {
                connection.as_mut().graceful_shutdown();
                connection.await
            }
        }
    }

    async fn handle_request(&self, request: http::Request<Incoming>) -> Response {
        let (parts, body) = request.into_parts();
        match Limited::new(body, self.config.max_body_bytes).collect().await {
            Ok(collected) => {
                let request = Request::from_parts(parts, collected.to_bytes());
                self.table.handle(request).await
            }
            Err(e) => {
                let error = if e.downcast_ref::<LengthLimitError>().is_some() {
                    DispatchError::http(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!("request body exceeds {} bytes", self.config.max_body_bytes),
                    )
                } else {
                    DispatchError::http(StatusCode::BAD_REQUEST, format!("cannot read request body: {e}"))
                };
                tracing::debug!(path = parts.uri.path(), error = %error, "request body rejected");
                let head = RequestHead {
                    method: parts.method,
                    uri: parts.uri,
                    headers: parts.headers,
                };
                self.table
                    .error_channel()
                    .respond(&Rejection::new(error), &head)
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("routes", &self.table.len())
            .finish()
    }
}
