//! Configuration loading and typed config structures for the wall server.
//!
//! The configuration lives in `mobilesync.yaml` next to the binary. This
//! module defines strongly-typed structs that mirror the YAML structure,
//! and a loader that reads the file and applies environment overrides.
//! Every section is optional; missing values fall back to the defaults of
//! a 3x3 video wall resyncing every 30 seconds.
//!
//! Parsing and validation are separate steps. [`AppConfig`] holds raw
//! values as written; [`AppConfig::session`] turns them into a validated
//! [`SessionConfig`] or fails with the name of the bad field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::session::{ContentMode, SessionConfig};

/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "MOBILESYNC_HOST";

/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "MOBILESYNC_PORT";

/// Environment variable overriding `session.period`.
pub const ENV_PERIOD: &str = "MOBILESYNC_PERIOD";

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A configuration value is out of range.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("invalid environment override {var}: {reason}")]
    InvalidOverride {
        /// Name of the environment variable.
        var: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `mobilesync.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Grid, period and content mode.
    #[serde(default)]
    pub session: SessionSettings,

    /// Resync clock settings.
    #[serde(default)]
    pub clock: ClockSettings,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Template and static file locations.
    #[serde(default)]
    pub assets: AssetSettings,
}

impl AppConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override file values:
    /// - `MOBILESYNC_HOST` overrides `server.host`
    /// - `MOBILESYNC_PORT` overrides `server.port`
    /// - `MOBILESYNC_PERIOD` overrides `session.period`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from a variable lookup (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if a numeric override does
    /// not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::InvalidOverride {
                var: ENV_PORT,
                reason: format!("{port:?}: {e}"),
            })?;
        }
        if let Some(period) = lookup(ENV_PERIOD) {
            self.session.period =
                period.trim().parse().map_err(|e| ConfigError::InvalidOverride {
                    var: ENV_PERIOD,
                    reason: format!("{period:?}: {e}"),
                })?;
        }
        Ok(())
    }

    /// Validate the session section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] naming the first invalid field.
    pub fn session(&self) -> Result<SessionConfig, ConfigError> {
        SessionConfig::new(
            self.session.grid_width,
            self.session.grid_height,
            self.session.period,
            self.session.content_mode,
        )
    }
}

/// Raw session parameters, exactly as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionSettings {
    /// Number of screens per row.
    #[serde(default = "default_grid_dimension")]
    pub grid_width: i64,

    /// Number of rows.
    #[serde(default = "default_grid_dimension")]
    pub grid_height: i64,

    /// Resync period in seconds.
    #[serde(default = "default_period")]
    pub period: i64,

    /// `video` or `image`.
    #[serde(default)]
    pub content_mode: ContentMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            grid_width: default_grid_dimension(),
            grid_height: default_grid_dimension(),
            period: default_period(),
            content_mode: ContentMode::default(),
        }
    }
}

/// Resync clock settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClockSettings {
    /// Seconds to wait after startup before the first boundary computation.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
}

impl ClockSettings {
    /// The startup delay as a [`Duration`].
    pub const fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Template and static file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetSettings {
    /// Directory holding `index.html`, `video.html` and `image.html`.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Directory served for every path not matched by a page route.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            static_dir: default_static_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_grid_dimension() -> i64 {
    3
}

const fn default_period() -> i64 {
    30
}

const fn default_startup_delay_secs() -> u64 {
    3
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
