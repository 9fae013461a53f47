//! Resync clock and session configuration for the mobileSYNC video wall.
//!
//! A wall is a grid of independent display devices, each showing one tile
//! of a larger picture or video. Devices poll the server on their own, so
//! the only way to keep the tiles in lock-step is to agree on *when* to
//! reload. This crate owns that agreement.
//!
//! # Modules
//!
//! - [`clock`] -- Pure boundary arithmetic (`period - now mod period`),
//!   countdown cadence, and the [`TimeSource`] abstraction.
//! - [`config`] -- Configuration loading from `mobilesync.yaml` into
//!   strongly-typed structs, with environment overrides.
//! - [`session`] -- The validated, immutable [`SessionConfig`] and the
//!   lock-free [`SessionProvider`] handed to every reader.
//! - [`sync`] -- The cancellable background resync loop and its event sinks.
//!
//! [`TimeSource`]: clock::TimeSource
//! [`SessionConfig`]: session::SessionConfig
//! [`SessionProvider`]: session::SessionProvider

pub mod clock;
pub mod config;
pub mod session;
pub mod sync;
