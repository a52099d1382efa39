//! Subcommands

pub mod check;
pub mod filter;

use std::path::{Path, PathBuf};

use acomms_config::Config;
use anyhow::{Context, Result, bail};

/// Searched in order when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/config.toml", "acomms.toml"];

/// Load the configuration file
///
/// An explicit path must exist. Without one the default locations are tried;
/// the category table has no defaults, so finding nothing is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    for candidate in DEFAULT_CONFIG_PATHS.map(PathBuf::from) {
        if candidate.exists() {
            return Config::from_file(&candidate).with_context(|| {
                format!("failed to load configuration from {}", candidate.display())
            });
        }
    }

    bail!(
        "no configuration file found (tried {}); pass --config",
        DEFAULT_CONFIG_PATHS.join(", ")
    )
}
