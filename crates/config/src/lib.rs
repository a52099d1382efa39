//! acomms configuration
//!
//! TOML-based configuration with sensible defaults. Only the category table is
//! required; every other section can be omitted.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use acomms_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[categories.sentry_status]\nidentifiers = [0]\nfields = [\"x\", \"y\"]",
//! )
//! .unwrap();
//! assert_eq!(config.categories.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [filter]
//! profile = "vehicle"
//! target = "/data/raw/sentry_raw.txt"
//! output_dir = "/data/filtered"
//! name = "sentry"
//!
//! [categories.sentry_science]
//! identifiers = [34]
//! separator = "whitespace"
//! fields = ["oxygen_concentration", "obs_raw", "orp_raw"]
//! ```
//!
//! See `configs/config.toml` and `configs/usbl.toml` for complete examples.

mod categories;
mod error;
mod filter;
mod logging;
mod metrics;
mod positioning;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use categories::{
    CategoriesConfig, CategoryConfig, KNOWN_FIELD_KINDS, TrailingMode, is_known_field_kind,
};
pub use error::{ConfigError, Result};
pub use filter::{FilterConfig, ProfileKind, StartAt, TruncatePolicy, default_cursor_path};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::MetricsConfig;
pub use positioning::PositioningConfig;

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Periodic stats reporting
    pub metrics: MetricsConfig,

    /// Filter instance settings
    pub filter: FilterConfig,

    /// Positioning header checks
    pub positioning: PositioningConfig,

    /// Identifier registry document
    pub categories: CategoriesConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Run again after applying command line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Category names in registry order
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
