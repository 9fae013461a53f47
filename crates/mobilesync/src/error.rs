//! Error types for the mobileSYNC binary.
//!
//! [`AppError`] is the top-level error type that wraps every failure mode
//! of startup and shutdown. All of them end the process.

/// Top-level error for the mobileSYNC binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: mobilesync_core::config::ConfigError,
    },

    /// Page templates could not be loaded.
    #[error("template error: {source}")]
    Pages {
        /// The underlying template error.
        #[from]
        source: mobilesync_web::PageError,
    },

    /// The wall server failed to start.
    #[error("server error: {source}")]
    Server {
        /// The underlying startup error.
        #[from]
        source: mobilesync_web::StartupError,
    },

    /// The wall server stopped on its own.
    #[error("serve error: {source}")]
    Serve {
        /// The underlying server error.
        #[from]
        source: mobilesync_web::ServerError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A background task panicked or was aborted.
    #[error("task error: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
