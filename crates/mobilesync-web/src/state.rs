//! Shared application state for the wall server.
//!
//! [`AppState`] holds the read-only session handle, the compiled page
//! templates, the static asset directory and the time source used for
//! sync-status answers. Nothing in it is ever mutated after startup, so
//! handlers read it without locks.

use std::path::PathBuf;
use std::sync::Arc;

use mobilesync_core::clock::{SystemTimeSource, TimeSource};
use mobilesync_core::session::SessionProvider;

use crate::pages::PageRenderer;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The wall's session configuration.
    pub session: SessionProvider,
    /// Compiled grid and media page templates.
    pub pages: Arc<PageRenderer>,
    /// Directory served for all non-page paths.
    pub static_dir: PathBuf,
    /// Wall clock used by `/api/sync`.
    pub time: Arc<dyn TimeSource>,
}

impl AppState {
    /// Create application state reading the system clock.
    pub fn new(session: SessionProvider, pages: PageRenderer, static_dir: PathBuf) -> Self {
        Self {
            session,
            pages: Arc::new(pages),
            static_dir,
            time: Arc::new(SystemTimeSource),
        }
    }

    /// Replace the time source (tests pin the clock with this).
    #[must_use]
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }
}
