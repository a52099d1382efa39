//! Pipeline error types
//!
//! Only conditions that end a run are errors here. Skipped lines, a missing
//! raw log and a single failing category are counted and logged instead.

use std::path::PathBuf;

use acomms_routing::RegistryError;
use acomms_sinks::SinkError;
use acomms_sources::CursorError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Raw log shrank and the truncate policy is `stop`
    #[error("raw log truncated (reader at byte {position}, file has {size} bytes)")]
    Truncated { position: u64, size: u64 },

    /// Raw log was replaced by another file and the truncate policy is `stop`
    #[error("raw log replaced (reader was at byte {position} of the previous file)")]
    Replaced { position: u64 },

    /// Output side failed beyond what disabling one category covers
    #[error("category output failed: {0}")]
    Sink(#[from] SinkError),

    /// Cursor could not be loaded or saved
    #[error("cursor failed: {0}")]
    Cursor(#[from] CursorError),

    /// Registry could not be built from configuration
    #[error("invalid identifier registry: {0}")]
    Registry(#[from] RegistryError),

    /// Required filter setting is absent
    #[error("filter setting '{0}' is required")]
    MissingSetting(&'static str),

    /// Cursor path could not be derived
    #[error("cannot derive a cursor path for '{}'", target.display())]
    NoCursorPath { target: PathBuf },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
