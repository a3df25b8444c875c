//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinSet;
use tokio::signal;
use tokio::time::timeout;
use log::{debug, error, info, warn};

use crate::parser::Method;
use crate::server::config::ServerConfig;
use crate::server::connection::handle_connection;
use crate::server::context::Context;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::router::Router;

/// Read-only state shared by all connection tasks.
struct Shared {
    router: Router,
    config: ServerConfig,
}

/// An HTTP server.
///
/// Routes and handlers are registered on the server before it starts. The
/// `listen*` and `serve` methods consume the server, so the route table can
/// no longer change once connections are being accepted.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Router::new(),
        }
    }

    /// The route table.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Add a route to the server.
    ///
    /// Routes within a method are tried in the order they were added.
    pub fn route<F>(&mut self, method: Method, template: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.router.add(method, template, Arc::new(handler))?;
        Ok(self)
    }

    /// Add a GET route.
    pub fn get<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.route(Method::GET, template, handler)
    }

    /// Add a POST route.
    pub fn post<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.route(Method::POST, template, handler)
    }

    /// Add a PUT route.
    pub fn put<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.route(Method::PUT, template, handler)
    }

    /// Add a DELETE route.
    pub fn delete<F>(&mut self, template: &str, handler: F) -> Result<&mut Self, Error>
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.route(Method::DELETE, template, handler)
    }

    /// Set the handler for requests no route matches. Without one, such
    /// requests get an empty 404.
    pub fn set_not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.router.set_not_found(Arc::new(handler));
        self
    }

    /// Set the handler for handler failures. Required before serving.
    pub fn set_error<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context, Error) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.router.set_error(Arc::new(handler));
        self
    }

    /// Display the registered endpoints.
    fn display_server_info(&self) {
        info!("Registered endpoints:");
        for route in self.router.iter() {
            info!("  {method} {template}", method = route.method, template = route.pattern.template());
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(addr: impl ToSocketAddrs) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Error binding listener: {e}");
            e
        })?;
        if let Ok(addr) = listener.local_addr() {
            info!("Server listening on http://{addr}");
        }
        Ok(listener)
    }

    /// Bind `addr` and serve until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Fails without binding when no error handler is set, and when the
    /// address cannot be bound.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> Result<(), Error> {
        self.router.validate()?;
        let listener = Self::setup_listener(addr).await?;
        self.serve(listener, ctrl_c()).await
    }

    /// Like [`listen`](Self::listen), but reports readiness on `ready`.
    ///
    /// `ready` receives the bound address once the listener is up, or `None`
    /// if the server could not start.
    pub async fn listen_notify(
        self,
        addr: impl ToSocketAddrs,
        ready: oneshot::Sender<Option<SocketAddr>>,
    ) -> Result<(), Error> {
        let setup = match self.router.validate() {
            Ok(()) => Self::setup_listener(addr).await,
            Err(e) => Err(e),
        };

        let listener = match setup {
            Ok(listener) => listener,
            Err(e) => {
                let _ = ready.send(None);
                return Err(e);
            }
        };

        let _ = ready.send(listener.local_addr().ok());
        self.serve(listener, ctrl_c()).await
    }

    /// Accept connections on `listener` until `shutdown` resolves.
    ///
    /// Each connection is handled on its own task. After shutdown, in-flight
    /// connections get up to 30 seconds to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.router.validate()?;
        self.display_server_info();

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        let shared = Arc::new(Shared {
            router: self.router,
            config: self.config,
        });

        // Use JoinSet to keep track of all spawned tasks
        let mut tasks = JoinSet::new();

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check for shutdown signal
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                // Accept new connections
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_new_connection(socket, addr, &semaphore, &shared, &mut tasks);
                        }
                        Err(e) => {
                            if Self::handle_connection_error(e).await {
                                break;
                            }
                        }
                    }
                }
            }

            // Reap finished connections
            while let Some(res) = tasks.try_join_next() {
                if let Err(e) = res {
                    error!("Connection task failed: {e}");
                }
            }
        }

        // Perform graceful shutdown
        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    /// Spawn the task for a new connection.
    fn handle_new_connection(
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: &Arc<Semaphore>,
        shared: &Arc<Shared>,
        tasks: &mut JoinSet<()>,
    ) {
        // Try to acquire a permit from the semaphore
        let permit = match Arc::clone(semaphore).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Connection limit reached, rejecting connection from {addr}");
                tasks.spawn(async move {
                    if let Err(e) = reject_connection(&mut socket).await {
                        debug!("Error rejecting connection from {addr}: {e}");
                    }
                });
                return;
            }
        };

        let shared = Arc::clone(shared);

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            if let Err(e) = handle_connection(&mut socket, &shared.router, &shared.config).await {
                debug!("Connection from {addr} ended with error: {e}");
            }
        });
    }

    /// Handle connection errors.
    async fn handle_connection_error(e: std::io::Error) -> bool {
        error!("Error accepting connection: {e}");

        // If there's a critical error, signal to break the loop
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            error!("Critical error accepting connection, shutting down");
            return true;
        }

        // For other errors, wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        false
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        // Wait for all tasks to complete (with timeout)
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        }).await;

        info!("Server shutdown complete");
    }
}

/// Upper bound for writing the over-capacity response.
pub(crate) const REJECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Answer 503 and close, giving up after [`REJECT_TIMEOUT`].
pub(crate) async fn reject_connection<S>(socket: &mut S) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    let response = HttpResponse::new(StatusCode::ServiceUnavailable)
        .with_body_string("Server is at capacity, please try again later")
        .to_bytes()?;

    let write = async {
        socket.write_all(&response).await?;
        socket.shutdown().await
    };
    match timeout(REJECT_TIMEOUT, write).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::Timeout("rejecting an over-capacity connection")),
    }
}

/// Resolves on Ctrl+C. If the handler cannot be installed it never resolves.
async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(e) => {
            error!("Error setting up Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}
