//! TCP server for the relay daemon.
//!
//! The server:
//! - Listens on the fixed relay address for client connections
//! - Spawns a `SessionHandler` task for each accepted connection
//! - Survives individual accept failures
//! - Supports graceful shutdown via `CancellationToken`
//!
//! There is deliberately no connection limit and no idle-connection
//! reaping; sessions end only when their own read path does.

mod session;

pub use session::{SessionError, SessionHandler};

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use relay_core::SessionId;

use crate::registry::RegistryHandle;
use crate::router::Router;

/// The relay's fixed listen address. There is no CLI or config surface.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// TCP server for the relay daemon.
///
/// Accepts connections until cancelled; one session task per client.
pub struct RelayServer {
    /// Bound listener (bound in [`Self::bind`] so tests can use port 0)
    listener: TcpListener,

    /// Resolved local address of the listener
    local_addr: SocketAddr,

    /// Handle to the session registry
    registry: RegistryHandle,

    /// Router shared with every spawned session
    router: Router,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for assigning session ids
    connection_counter: AtomicU64,
}

impl RelayServer {
    /// Binds the listener.
    ///
    /// A bind failure is fatal to the daemon - there is nothing to serve
    /// without a socket.
    pub async fn bind(
        addr: &str,
        registry: RegistryHandle,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        })?;

        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        })?;

        let router = Router::new(registry.clone());

        Ok(Self {
            listener,
            local_addr,
            registry,
            router,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the accept loop until the cancellation token is triggered.
    ///
    /// A failed accept is logged and the loop continues; a single bad
    /// connection attempt must not take the service down.
    pub async fn run(&self) {
        info!(addr = %self.local_addr, "relay server listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("server shutdown requested");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.handle_connection(stream, peer),
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }

        info!("server stopped");
    }

    /// Spawns a session task for a newly accepted connection.
    fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let id = SessionId::new(self.connection_counter.fetch_add(1, Ordering::Relaxed));

        info!(session = %id, peer = %peer, "client connected");

        let handler = SessionHandler::new(
            id,
            stream,
            self.registry.clone(),
            self.router.clone(),
            self.cancel_token.clone(),
        );

        tokio::spawn(handler.run());
    }
}

/// Errors that can occur in server setup.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },
}
