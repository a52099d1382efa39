//! acomms pipeline - the continuous filter loop
//!
//! Connects the tailing reader, the decoder and the category writer on one
//! sequential path and checkpoints the cursor after every line.
//!
//! # Architecture
//!
//! ```text
//! raw log ──> TailReader ──> Decoder ──> CategoryWriter ──> {name}_{category}.txt
//!                                │
//!                                └──> FilterMetrics ──> StatsReporter (own task)
//! ```
//!
//! # Key Design
//!
//! - **Sequential**: one task reads, decodes, writes and checkpoints; output
//!   order per category equals input order
//! - **At-least-once**: the cursor moves only after the record is written
//! - **Skips are counted**: unframed, unknown and malformed lines never stop a run
//! - **Metrics handle**: counters stay readable after `run()` consumes the loop
//!
//! # Example
//!
//! ```ignore
//! use acomms_pipeline::{FilterLoop, StatsReporter};
//! use tokio_util::sync::CancellationToken;
//!
//! let filter = FilterLoop::from_config(&config)?;
//! let cancel = CancellationToken::new();
//!
//! let reporter = StatsReporter::new(filter.metrics_handle(), &config.metrics);
//! tokio::spawn(reporter.run(cancel.clone()));
//!
//! let summary = filter.run(cancel).await?;
//! ```

mod error;
mod filter;
mod metrics;
mod reporter;
mod settings;

pub use error::{PipelineError, Result};
pub use filter::FilterLoop;
pub use metrics::{FilterMetrics, FilterMetricsHandle, MetricsSnapshot};
pub use reporter::StatsReporter;
pub use settings::FilterSettings;
