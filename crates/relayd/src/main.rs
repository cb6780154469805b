//! relayd - line-oriented chat relay daemon.
//!
//! Accepts TCP connections on the fixed relay port, registers clients
//! under unique display names, and relays chat lines back to their sender
//! or to everyone (`[B]` marker in the body).
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! relayd
//!
//! # Enable debug logging
//! RUST_LOG=relayd=debug relayd
//! ```
//!
//! There is no CLI or config surface; the listen address is a fixed
//! constant.
//!
//! # Signal Handling
//!
//! SIGTERM/SIGINT trigger a graceful shutdown: the acceptor stops and
//! every session winds down cooperatively.

use std::process;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relayd::registry::spawn_registry;
use relayd::server::{RelayServer, DEFAULT_LISTEN_ADDR};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relayd=info".parse()?)
                .add_directive("relay_protocol=info".parse()?)
                .add_directive("relay_core=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "relay daemon starting"
    );

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Setup signal handlers
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "error waiting for shutdown signal");
        }
        info!("shutdown signal received");
        shutdown_token.cancel();
    });

    // Spawn the session registry
    let registry = spawn_registry();
    info!("session registry started");

    // Bind and run the server; a bind failure is fatal
    let server = RelayServer::bind(DEFAULT_LISTEN_ADDR, registry, cancel_token).await?;
    server.run().await;

    info!("relay daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("received Ctrl+C");
    }

    Ok(())
}
