//! Common types for the category writer
//!
//! Errors and counters shared by every stream the writer owns.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use acomms_protocol::CategoryId;
use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Counters for the category writer
#[derive(Debug, Default)]
pub struct WriterMetrics {
    /// Records appended to a stream
    pub records_written: AtomicU64,

    /// Bytes appended, including newlines
    pub bytes_written: AtomicU64,

    /// Failed write attempts (first tries and retries)
    pub write_errors: AtomicU64,

    /// Records dropped because their category is disabled
    pub records_dropped: AtomicU64,

    /// Streams opened, including reopens after a failure
    pub streams_opened: AtomicU64,

    /// Categories disabled after a failed retry
    pub categories_disabled: AtomicU64,

    /// Partial records cut from a stream before a retry
    pub partials_trimmed: AtomicU64,
}

impl WriterMetrics {
    pub const fn new() -> Self {
        Self {
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            records_dropped: AtomicU64::new(0),
            streams_opened: AtomicU64::new(0),
            categories_disabled: AtomicU64::new(0),
            partials_trimmed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_written(&self, bytes: u64) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn stream_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn category_disabled(&self) {
        self.categories_disabled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn partial_trimmed(&self) {
        self.partials_trimmed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> WriterMetricsSnapshot {
        WriterMetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            categories_disabled: self.categories_disabled.load(Ordering::Relaxed),
            partials_trimmed: self.partials_trimmed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of writer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterMetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub records_dropped: u64,
    pub streams_opened: u64,
    pub categories_disabled: u64,
    pub partials_trimmed: u64,
}

impl WriterMetricsSnapshot {
    /// Calculate the difference from an earlier snapshot
    pub fn diff(&self, previous: &WriterMetricsSnapshot) -> WriterMetricsSnapshot {
        WriterMetricsSnapshot {
            records_written: self.records_written.saturating_sub(previous.records_written),
            bytes_written: self.bytes_written.saturating_sub(previous.bytes_written),
            write_errors: self.write_errors.saturating_sub(previous.write_errors),
            records_dropped: self.records_dropped.saturating_sub(previous.records_dropped),
            streams_opened: self.streams_opened.saturating_sub(previous.streams_opened),
            categories_disabled: self
                .categories_disabled
                .saturating_sub(previous.categories_disabled),
            partials_trimmed: self.partials_trimmed.saturating_sub(previous.partials_trimmed),
        }
    }
}

/// Category writer errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Output directory or stream could not be created
    #[error("failed to open '{}': {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Append or flush on an open stream failed
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Record carries a category the writer was not built with
    #[error("no output stream for {category}")]
    UnknownCategory { category: CategoryId },

    /// Two distinct categories have failed; the output side is unusable
    #[error("output failing for categories '{first}' and '{second}'")]
    Systemic {
        first: String,
        second: String,
        #[source]
        source: Box<SinkError>,
    },
}

impl SinkError {
    /// Create a Create error
    #[inline]
    pub fn create(path: &Path, source: io::Error) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a Write error
    #[inline]
    pub fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a Systemic error
    pub fn systemic(first: impl Into<String>, second: impl Into<String>, source: SinkError) -> Self {
        Self::Systemic {
            first: first.into(),
            second: second.into(),
            source: Box::new(source),
        }
    }

    /// True if the run cannot continue
    #[inline]
    pub fn is_systemic(&self) -> bool {
        matches!(self, Self::Systemic { .. })
    }
}
