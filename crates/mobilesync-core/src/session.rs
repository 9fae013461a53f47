//! Immutable session configuration for a running wall.
//!
//! A [`SessionConfig`] is built once at startup from the loaded
//! configuration file and never changes afterwards. The resync clock and
//! every HTTP request read it through a [`SessionProvider`], a cheap
//! cloneable handle over an [`Arc`]. Because the value is never mutated,
//! readers need no synchronization at all.
//!
//! # Design Principles
//!
//! - Validation happens exactly once, in [`SessionConfig::new`]. An invalid
//!   grid or period is a [`ConfigError::InvalidField`] naming the field.
//! - There is no setter. Runtime reconfiguration would need an explicit
//!   atomic swap of the whole snapshot.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::clock::Period;
use crate::config::ConfigError;

/// What the wall displays.
///
/// Only video content needs periodic resynchronization; a still image is
/// loaded once and stays put.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Static image tiles. The resync clock never starts.
    Image,
    /// Looping video tiles, reloaded on every boundary.
    #[default]
    Video,
}

impl ContentMode {
    /// Whether this mode requires the background resync clock.
    pub const fn needs_resync(self) -> bool {
        matches!(self, Self::Video)
    }

    /// Lowercase name, as used in the configuration file.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row and column of a grid slot, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotPosition {
    /// Zero-based row (0 = top).
    pub row: u32,
    /// Zero-based column (0 = left).
    pub column: u32,
}

/// Validated wall parameters, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    grid_width: u32,
    grid_height: u32,
    period: Period,
    content_mode: ContentMode,
}

impl SessionConfig {
    /// Validate raw values and build a session configuration.
    ///
    /// Values arrive as signed integers so that negative input from the
    /// configuration file is reported against the offending field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] if `grid_width` or
    /// `grid_height` is below 1 or does not fit in a `u32`, or if `period`
    /// is below 1.
    pub fn new(
        grid_width: i64,
        grid_height: i64,
        period: i64,
        content_mode: ContentMode,
    ) -> Result<Self, ConfigError> {
        let grid_width = grid_dimension("grid_width", grid_width)?;
        let grid_height = grid_dimension("grid_height", grid_height)?;
        let period = Period::from_secs(period).ok_or_else(|| ConfigError::InvalidField {
            field: "period",
            reason: format!("must be at least 1 second, got {period}"),
        })?;

        Ok(Self {
            grid_width,
            grid_height,
            period,
            content_mode,
        })
    }

    /// Number of screens per row.
    pub const fn grid_width(&self) -> u32 {
        self.grid_width
    }

    /// Number of rows.
    pub const fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Resync period.
    pub const fn period(&self) -> Period {
        self.period
    }

    /// What the wall displays.
    pub const fn content_mode(&self) -> ContentMode {
        self.content_mode
    }

    /// Number of addressable device slots (`grid_width * grid_height`).
    pub fn slot_count(&self) -> u64 {
        u64::from(self.grid_width).saturating_mul(u64::from(self.grid_height))
    }

    /// Map a slot id to its row and column.
    ///
    /// Slots are numbered left to right, top to bottom. Returns `None` for
    /// ids outside `[0, slot_count)`.
    pub fn slot_position(&self, slot: i64) -> Option<SlotPosition> {
        let slot = u64::try_from(slot).ok()?;
        if slot >= self.slot_count() {
            return None;
        }
        let width = u64::from(self.grid_width);
        let row = u32::try_from(slot.checked_div(width)?).ok()?;
        let column = u32::try_from(slot.checked_rem(width)?).ok()?;
        Some(SlotPosition { row, column })
    }
}

/// Check one grid dimension.
fn grid_dimension(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value < 1 {
        return Err(ConfigError::InvalidField {
            field,
            reason: format!("must be at least 1, got {value}"),
        });
    }
    u32::try_from(value).map_err(|_err| ConfigError::InvalidField {
        field,
        reason: format!("{value} exceeds the u32 range"),
    })
}

/// Read-only handle to the session configuration.
///
/// Cloning the provider clones an [`Arc`]; every clone sees the same
/// snapshot. [`get`](Self::get) never blocks.
#[derive(Debug, Clone)]
pub struct SessionProvider {
    inner: Arc<SessionConfig>,
}

impl SessionProvider {
    /// Wrap a validated configuration for sharing.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(config),
        }
    }

    /// Return the configuration snapshot.
    pub fn get(&self) -> SessionConfig {
        *self.inner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn field_of(err: &ConfigError) -> &'static str {
        match err {
            ConfigError::InvalidField { field, .. } => *field,
            other => panic!("expected InvalidField, got {other:?}"),
        }
    }

    #[test]
    fn valid_session_keeps_values() {
        let cfg = SessionConfig::new(3, 2, 30, ContentMode::Video).unwrap();
        assert_eq!(cfg.grid_width(), 3);
        assert_eq!(cfg.grid_height(), 2);
        assert_eq!(cfg.period().as_secs(), 30);
        assert_eq!(cfg.content_mode(), ContentMode::Video);
        assert_eq!(cfg.slot_count(), 6);
    }

    #[test]
    fn zero_period_is_rejected() {
        let err = SessionConfig::new(3, 3, 0, ContentMode::Video).unwrap_err();
        assert_eq!(field_of(&err), "period");
    }

    #[test]
    fn negative_period_is_rejected() {
        let err = SessionConfig::new(3, 3, -5, ContentMode::Video).unwrap_err();
        assert_eq!(field_of(&err), "period");
        assert!(err.to_string().contains("period"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = SessionConfig::new(0, 3, 30, ContentMode::Image).unwrap_err();
        assert_eq!(field_of(&err), "grid_width");
    }

    #[test]
    fn zero_height_is_rejected() {
        let err = SessionConfig::new(3, 0, 30, ContentMode::Image).unwrap_err();
        assert_eq!(field_of(&err), "grid_height");
    }

    #[test]
    fn oversized_width_is_rejected() {
        let err = SessionConfig::new(4_294_967_296, 1, 30, ContentMode::Image).unwrap_err();
        assert_eq!(field_of(&err), "grid_width");
    }

    #[test]
    fn slot_positions_run_left_to_right() {
        let cfg = SessionConfig::new(3, 2, 30, ContentMode::Video).unwrap();
        assert_eq!(cfg.slot_position(0), Some(SlotPosition { row: 0, column: 0 }));
        assert_eq!(cfg.slot_position(2), Some(SlotPosition { row: 0, column: 2 }));
        assert_eq!(cfg.slot_position(4), Some(SlotPosition { row: 1, column: 1 }));
        assert_eq!(cfg.slot_position(6), None);
        assert_eq!(cfg.slot_position(-1), None);
    }

    #[test]
    fn content_mode_only_video_resyncs() {
        assert!(ContentMode::Video.needs_resync());
        assert!(!ContentMode::Image.needs_resync());
        assert_eq!(ContentMode::Image.to_string(), "image");
    }

    #[test]
    fn provider_clones_share_snapshot() {
        let cfg = SessionConfig::new(4, 4, 10, ContentMode::Video).unwrap();
        let provider = SessionProvider::new(cfg);
        let other = provider.clone();
        assert_eq!(provider.get(), cfg);
        assert_eq!(other.get(), cfg);
    }
}
