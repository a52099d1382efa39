//! Filter instance configuration
//!
//! Everything one filter run needs besides the category table: which framing
//! profile to apply, which raw log to tail, where category outputs and the
//! cursor live, and how to react to source trouble. Every field can be
//! overridden from the command line.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Framing profile selector
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Vehicle modem traffic, identified by `SDQ <queue>:`
    #[default]
    Vehicle,
    /// USBL navigation fixes, identified by asset id
    Positioning,
    /// `identifier,timestamp,payload` lines
    Delimited,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Positioning => "positioning",
            Self::Delimited => "delimited",
        }
    }
}

/// Where to start when no cursor exists for the target
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartAt {
    /// Process the whole existing log
    #[default]
    Beginning,
    /// Skip everything already complete in the log
    End,
}

/// Reaction to the raw log shrinking under the reader or being replaced by
/// a new file at the same path
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TruncatePolicy {
    /// End the run with an error
    #[default]
    Stop,
    /// Start over from offset 0
    Rewind,
}

/// Filter configuration
///
/// # Example
///
/// ```toml
/// [filter]
/// profile = "vehicle"
/// target = "/data/raw/sentry_raw.txt"
/// output_dir = "/data/filtered"
/// name = "sentry"
/// poll_interval = "250ms"
/// on_truncate = "stop"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Framing profile
    pub profile: ProfileKind,

    /// Field separator for the delimited profile
    /// Default: ','
    pub delimiter: char,

    /// Raw log to tail
    pub target: Option<PathBuf>,

    /// Directory receiving the category outputs
    pub output_dir: Option<PathBuf>,

    /// Output file prefix: `{name}_{category}.txt`
    /// Default: "" (no prefix)
    pub name: String,

    /// Cursor file
    /// Default: `{output_dir}/.{name}_{profile}.cursor.json`
    pub cursor_path: Option<PathBuf>,

    /// Start position when no cursor exists
    /// Default: beginning
    pub start_at: StartAt,

    /// Wait between polls when the log has no new complete line
    /// Default: 250ms
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Ceiling for the retry backoff while the log is missing
    /// Default: 5s
    #[serde(with = "humantime_serde")]
    pub missing_backoff_max: Duration,

    /// Applies to truncation and to replacement of the raw log
    /// Default: stop
    pub on_truncate: TruncatePolicy,

    /// `sync_data` after every category write
    /// Default: false
    pub durable: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            profile: ProfileKind::Vehicle,
            delimiter: ',',
            target: None,
            output_dir: None,
            name: String::new(),
            cursor_path: None,
            start_at: StartAt::Beginning,
            poll_interval: Duration::from_millis(250),
            missing_backoff_max: Duration::from_secs(5),
            on_truncate: TruncatePolicy::Stop,
            durable: false,
        }
    }
}

impl FilterConfig {
    /// Cursor file path, explicit or derived from output dir, name and profile
    ///
    /// Returns `None` when neither a cursor path nor an output dir is set.
    pub fn effective_cursor_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cursor_path {
            return Some(path.clone());
        }
        self.output_dir
            .as_deref()
            .map(|dir| default_cursor_path(dir, &self.name, self.profile))
    }
}

/// `{output_dir}/.{name}_{profile}.cursor.json`
pub fn default_cursor_path(output_dir: &Path, name: &str, profile: ProfileKind) -> PathBuf {
    let file = if name.is_empty() {
        format!(".{}.cursor.json", profile.as_str())
    } else {
        format!(".{}_{}.cursor.json", name, profile.as_str())
    };
    output_dir.join(file)
}
