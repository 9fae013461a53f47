//! Wall server for mobileSYNC.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Grid page** (`GET /`) with one button per screen slot
//! - **Device page** (`/show_media`) rendering the video or image tile for
//!   the slot a device picked, with the resync period embedded
//! - **JSON endpoints** for the session configuration and the current
//!   boundary schedule
//! - **Static assets** (media files, scripts, styles) for every other path
//!
//! # Architecture
//!
//! Handlers only read the immutable session through [`AppState`]. The
//! resync clock runs elsewhere and never calls into this crate; devices
//! derive the same epoch-aligned boundaries from the period in their page.
//!
//! [`AppState`]: state::AppState

pub mod error;
pub mod handlers;
pub mod pages;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use pages::{PageError, PageRenderer};
pub use router::build_router;
pub use server::{ServerConfig, ServerError};
pub use startup::{RunningServer, StartupError, spawn_server};
pub use state::AppState;
