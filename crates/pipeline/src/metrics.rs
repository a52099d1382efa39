//! Filter loop metrics
//!
//! Atomic counters updated by the filter loop and read by the stats reporter.
//! All operations use relaxed ordering; readers see eventually consistent
//! values, never torn ones.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use acomms_protocol::{CategoryId, SkipKind};
use acomms_sinks::{WriterMetrics, WriterMetricsSnapshot};

/// Counters for one filter run
///
/// # Thread Safety
///
/// All methods are safe to call from multiple threads concurrently.
#[derive(Debug)]
pub struct FilterMetrics {
    /// Lines delivered by the reader
    lines_processed: AtomicU64,

    /// Empty or whitespace-only lines
    blank_lines: AtomicU64,

    /// Records written, indexed by `CategoryId`
    routed: Box<[AtomicU64]>,

    /// Skipped lines, indexed by `SkipKind::index`
    skipped: [AtomicU64; SkipKind::COUNT],

    /// Records dropped because their category was disabled
    write_failures: AtomicU64,

    /// Missing or unreadable raw log
    source_errors: AtomicU64,

    /// Rewinds after truncation or replacement
    rewinds: AtomicU64,

    /// Cursor saves
    checkpoints: AtomicU64,

    /// Counters of the category writer
    writer: Arc<WriterMetrics>,
}

impl FilterMetrics {
    /// Create counters for `categories` output categories
    pub fn new(categories: usize) -> Self {
        Self::with_writer(categories, Arc::new(WriterMetrics::new()))
    }

    /// Create counters that also report a category writer's counters
    pub fn with_writer(categories: usize, writer: Arc<WriterMetrics>) -> Self {
        Self {
            lines_processed: AtomicU64::new(0),
            blank_lines: AtomicU64::new(0),
            routed: (0..categories).map(|_| AtomicU64::new(0)).collect(),
            skipped: std::array::from_fn(|_| AtomicU64::new(0)),
            write_failures: AtomicU64::new(0),
            source_errors: AtomicU64::new(0),
            rewinds: AtomicU64::new(0),
            checkpoints: AtomicU64::new(0),
            writer,
        }
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_blank(&self) {
        self.blank_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record written to `category`
    ///
    /// Ids outside the table are ignored.
    #[inline]
    pub fn record_routed(&self, category: CategoryId) {
        if let Some(counter) = self.routed.get(category.index()) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_skip(&self, kind: SkipKind) {
        self.skipped[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rewind(&self) {
        self.rewinds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_processed: self.lines_processed.load(Ordering::Relaxed),
            blank_lines: self.blank_lines.load(Ordering::Relaxed),
            routed: self
                .routed
                .iter()
                .map(|c| c.load(Ordering::Relaxed))
                .collect(),
            skipped: std::array::from_fn(|i| self.skipped[i].load(Ordering::Relaxed)),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            rewinds: self.rewinds.load(Ordering::Relaxed),
            checkpoints: self.checkpoints.load(Ordering::Relaxed),
            writer: self.writer.snapshot(),
        }
    }
}

/// Point-in-time snapshot of filter metrics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub lines_processed: u64,
    pub blank_lines: u64,
    /// Records written per category, indexed by `CategoryId`
    pub routed: Vec<u64>,
    /// Skipped lines per `SkipKind`
    pub skipped: [u64; SkipKind::COUNT],
    pub write_failures: u64,
    pub source_errors: u64,
    pub rewinds: u64,
    pub checkpoints: u64,
    /// Category writer counters
    pub writer: WriterMetricsSnapshot,
}

impl MetricsSnapshot {
    /// Records written to one category
    #[inline]
    pub fn routed_to(&self, category: CategoryId) -> u64 {
        self.routed.get(category.index()).copied().unwrap_or(0)
    }

    /// Records written across all categories
    #[inline]
    pub fn routed_total(&self) -> u64 {
        self.routed.iter().sum()
    }

    /// Lines skipped for one reason
    #[inline]
    pub fn skipped(&self, kind: SkipKind) -> u64 {
        self.skipped[kind.index()]
    }

    /// Lines skipped for any reason
    #[inline]
    pub fn skipped_total(&self) -> u64 {
        self.skipped.iter().sum()
    }

    /// Calculate the difference from an earlier snapshot
    pub fn diff(&self, previous: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            lines_processed: self.lines_processed.saturating_sub(previous.lines_processed),
            blank_lines: self.blank_lines.saturating_sub(previous.blank_lines),
            routed: self
                .routed
                .iter()
                .enumerate()
                .map(|(i, n)| n.saturating_sub(previous.routed.get(i).copied().unwrap_or(0)))
                .collect(),
            skipped: std::array::from_fn(|i| self.skipped[i].saturating_sub(previous.skipped[i])),
            write_failures: self.write_failures.saturating_sub(previous.write_failures),
            source_errors: self.source_errors.saturating_sub(previous.source_errors),
            rewinds: self.rewinds.saturating_sub(previous.rewinds),
            checkpoints: self.checkpoints.saturating_sub(previous.checkpoints),
            writer: self.writer.diff(&previous.writer),
        }
    }
}

/// Handle for reading filter metrics from another task
///
/// Remains valid after `FilterLoop::run` consumes the loop.
#[derive(Debug, Clone)]
pub struct FilterMetricsHandle {
    metrics: Arc<FilterMetrics>,
    categories: Arc<[String]>,
}

impl FilterMetricsHandle {
    pub(crate) fn new(metrics: Arc<FilterMetrics>, categories: Arc<[String]>) -> Self {
        Self {
            metrics,
            categories,
        }
    }

    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Category names indexed by `CategoryId`
    #[inline]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
