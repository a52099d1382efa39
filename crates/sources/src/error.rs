//! Source error types

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reported by the tailing reader
///
/// `Missing`, `Truncated` and `Replaced` describe the state of the raw log,
/// not a fault of the reader; the filter loop decides how to react to each.
#[derive(Debug, Error)]
pub enum TailError {
    /// Raw log is absent or cannot be opened
    #[error("raw log '{}' is unavailable: {source}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Raw log is now shorter than what was already read
    #[error("raw log truncated: reader at byte {position}, file has {size} bytes")]
    Truncated { position: u64, size: u64 },

    /// Path now names a different file than the one being read
    ///
    /// Reported when the raw log vanished and came back, or was replaced by a
    /// new file between polls. Nothing of the new file has been read.
    #[error("raw log replaced: reader was at byte {position} of the previous file")]
    Replaced { position: u64 },

    /// Read failed on an open file
    #[error("failed to read raw log '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TailError {
    /// Create a Missing error
    #[inline]
    pub fn missing(path: &Path, source: io::Error) -> Self {
        Self::Missing {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an Io error
    #[inline]
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for the transient missing-file condition
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Errors reading or writing the cursor file
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cursor file '{}' is not valid: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CursorError {
    #[inline]
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    #[inline]
    pub fn format(path: &Path, source: serde_json::Error) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            source,
        }
    }
}
