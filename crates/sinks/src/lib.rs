//! acomms sinks - per-category output streams
//!
//! Decoded records leave the filter through one append-only text file per
//! category. Downstream plotters tail those files, so every record is written
//! as one whole line and flushed before the next line is read.
//!
//! ```text
//! [DecodedRecord] --> [CategoryWriter] --> {output_dir}/{name}_{category}.txt
//! ```
//!
//! # Output Format
//!
//! ```text
//! 2022-08-01 12:00:00,1294,3653,-12.5
//! ```
//!
//! No header row; the column order is the category schema for the whole run.
//!
//! # Failure Policy
//!
//! | Condition | Handling |
//! |-----------|----------|
//! | Write fails once | retried on a reopened handle |
//! | Retry fails | category disabled, its records dropped and counted |
//! | A second category fails | `SinkError::Systemic`, the run stops |

// =============================================================================
// Writers
// =============================================================================

/// Category writer - one append-only stream per category
pub mod category;

// =============================================================================
// Shared types and utilities
// =============================================================================

mod common;

/// Logging helpers shared with the filter loop
pub mod util;

pub use category::{CategoryWriter, CategoryWriterConfig, Delivery, stream_path};
pub use common::{Result, SinkError, WriterMetrics, WriterMetricsSnapshot};
