//! Wall server startup helper.
//!
//! Provides [`spawn_server`] which binds the listener and launches the
//! wall server on a background Tokio task. The binary calls this during
//! startup so the server runs concurrently with the resync clock.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mobilesync_web::startup::spawn_server;
//!
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let running = spawn_server(&server_config, state, shutdown_rx).await?;
//! // ... later
//! shutdown_tx.send(true)?;
//! running.handle.await??;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the wall server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// The address actually bound (useful with port 0).
    pub addr: SocketAddr,
    /// Resolves once the server has shut down, with the serve error if it
    /// stopped on its own.
    pub handle: JoinHandle<Result<(), ServerError>>,
}

/// Bind the wall server and run it on a background Tokio task.
///
/// Binding happens before the task is spawned, so a port that is already
/// taken is reported here rather than logged later from the task.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the server cannot bind to the
/// requested address.
pub async fn spawn_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) -> Result<RunningServer, StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener.local_addr().map_err(|e| {
        StartupError::Server(ServerError::Bind(format!("no local address: {e}")))
    })?;

    let handle = tokio::spawn(async move {
        server::serve(listener, state, shutdown)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "wall server exited with error"))
    });

    tracing::info!(%addr, "wall server spawned on background task");

    Ok(RunningServer { addr, handle })
}
