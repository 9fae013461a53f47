//! mobileSYNC binary.
//!
//! Wires the immutable wall session, the resync clock and the HTTP server
//! together, then runs until Ctrl-C or SIGTERM.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `$MOBILESYNC_CONFIG` or `mobilesync.yaml`
//! 3. Validate the session (invalid values end the process here)
//! 4. Load page templates
//! 5. Start the resync clock (video walls only)
//! 6. Start the wall server
//! 7. Wait for Ctrl-C, SIGTERM or the server stopping on its own, then stop
//!    both and wait for them to finish

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use mobilesync_core::clock::SystemTimeSource;
use mobilesync_core::config::AppConfig;
use mobilesync_core::session::SessionProvider;
use mobilesync_core::sync::{self, TracingSink};
use mobilesync_web::{AppState, PageRenderer, ServerConfig, ServerError};
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Environment variable naming the config file.
const ENV_CONFIG: &str = "MOBILESYNC_CONFIG";

/// Config file used when `MOBILESYNC_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "mobilesync.yaml";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "mobilesync failed");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    info!("mobilesync starting");

    // 2-3. Configuration.
    let config = load_config()?;
    let session = config.session()?;
    info!(
        grid_width = session.grid_width(),
        grid_height = session.grid_height(),
        period = session.period().as_secs(),
        content_mode = %session.content_mode(),
        "Configuration loaded"
    );

    // 4. Templates.
    let pages = PageRenderer::from_dir(&config.assets.templates_dir)?;
    info!(dir = %config.assets.templates_dir.display(), "Page templates loaded");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 5. Resync clock.
    let clock = sync::start_for_session(
        &session,
        config.clock.startup_delay(),
        Arc::new(SystemTimeSource),
        TracingSink,
        shutdown_rx.clone(),
    );

    // 6. Wall server.
    let state = Arc::new(AppState::new(
        SessionProvider::new(session),
        pages,
        config.assets.static_dir,
    ));
    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
    };
    let server = match mobilesync_web::spawn_server(&server_config, state, shutdown_rx).await {
        Ok(server) => server,
        Err(e) => {
            // The clock may already be running; stop it before bailing out.
            let _ = shutdown_tx.send(true);
            return Err(e.into());
        }
    };
    info!(addr = %server.addr, "mobilesync ready");

    // 7. Run until a signal, or until the server gives up.
    let mut server_task = server.handle;
    let stop = wait_for_stop(shutdown_signal(), &mut server_task).await;
    let _ = shutdown_tx.send(true);

    let (signal, served) = match stop {
        Stop::Signal(signal) => {
            info!("Shutdown requested");
            (signal, server_task.await)
        }
        Stop::ServerExited(joined) => {
            warn!("Wall server stopped unexpectedly, shutting down");
            (Ok(()), joined)
        }
    };
    if let Some(clock) = clock {
        let report = clock.await?;
        info!(
            resyncs = report.resyncs,
            last_boundary = ?report.last_boundary,
            "Resync clock finished"
        );
    }
    signal?;
    served??;

    info!("mobilesync shutdown complete");
    Ok(())
}

/// Why `run` stopped waiting.
enum Stop {
    /// A shutdown signal arrived (or listening for one failed).
    Signal(std::io::Result<()>),
    /// The server task ended before any signal.
    ServerExited(Result<Result<(), ServerError>, JoinError>),
}

/// Wait for `signal` or for the server task to end, whichever is first.
async fn wait_for_stop<F>(signal: F, server: &mut JoinHandle<Result<(), ServerError>>) -> Stop
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        signal = signal => Stop::Signal(signal),
        joined = server => Stop::ServerExited(joined),
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where there is one.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            ctrl_c = tokio::signal::ctrl_c() => ctrl_c,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Load configuration from `$MOBILESYNC_CONFIG`, or `mobilesync.yaml` in
/// the working directory.
///
/// A missing file means defaults plus environment overrides. A file that
/// exists but does not parse is an error.
fn load_config() -> Result<AppConfig, AppError> {
    let path = std::env::var_os(ENV_CONFIG)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if path.exists() {
        let config = AppConfig::from_file(&path)?;
        info!(path = %path.display(), "Config file loaded");
        Ok(config)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        let mut config = AppConfig::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }
}
