//! Rate-limited logging utility
//!
//! A raw log full of modem chatter, a missing source file or a full disk can
//! repeat the same condition on every line. This logger emits at most one
//! message per interval and reports how many were suppressed in between.
//!
//! # Example
//!
//! ```ignore
//! use acomms_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//!
//! // Only logs once per 10 seconds, even if called on every line
//! for line in lines {
//!     logger.warn_with_line("line skipped", &reason, line.text());
//! }
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval for rate-limited logging (10 seconds)
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum raw line length included in a log message
pub const MAX_LINE_LOG_LENGTH: usize = 256;

/// Rate-limited logger that prevents log spam
///
/// Thread-safe: uses atomic counters and a mutex for the last log time.
pub struct RateLimitedLogger {
    /// Minimum interval between log messages
    min_interval: Duration,

    /// Last time we logged
    last_log_time: Mutex<Option<Instant>>,

    /// Occurrences since the last emitted message
    pending: AtomicU64,

    /// Occurrences ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a new rate-limited logger with the specified interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a warning and log it if the interval has passed
    ///
    /// Returns true if the warning was logged, false if it was suppressed.
    pub fn warn(&self, message: &str, detail: &dyn Display) -> bool {
        let Some(suppressed) = self.record() else {
            return false;
        };
        let total = self.total.load(Ordering::Relaxed);

        if suppressed > 0 {
            tracing::warn!(%detail, suppressed, total, "{message} (rate-limited)");
        } else {
            tracing::warn!(%detail, total, "{message}");
        }
        true
    }

    /// Record a warning about a raw line; the line is truncated in the output
    pub fn warn_with_line(&self, message: &str, detail: &dyn Display, line: &str) -> bool {
        let Some(suppressed) = self.record() else {
            return false;
        };
        let total = self.total.load(Ordering::Relaxed);
        let line = truncate_line(line);

        if suppressed > 0 {
            tracing::warn!(%detail, %line, suppressed, total, "{message} (rate-limited)");
        } else {
            tracing::warn!(%detail, %line, total, "{message}");
        }
        true
    }

    /// Record an error and log it if the interval has passed
    pub fn error(&self, message: &str, error: &dyn Display) -> bool {
        let Some(suppressed) = self.record() else {
            return false;
        };
        let total = self.total.load(Ordering::Relaxed);

        if suppressed > 0 {
            tracing::error!(%error, suppressed, total, "{message} (rate-limited)");
        } else {
            tracing::error!(%error, total, "{message}");
        }
        true
    }

    /// Occurrences recorded but not yet reported
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Occurrences ever recorded
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.pending.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        *self.last_log_time.lock() = None;
    }

    /// Count one occurrence; returns the number suppressed since the last
    /// message if this one should be logged
    fn record(&self) -> Option<u64> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        let should_log = {
            let mut last_time = self.last_log_time.lock();
            let now = Instant::now();

            match *last_time {
                Some(last) if now.duration_since(last) < self.min_interval => false,
                _ => {
                    *last_time = Some(now);
                    true
                }
            }
        };

        should_log.then(|| self.pending.swap(0, Ordering::Relaxed).saturating_sub(1))
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

fn truncate_line(line: &str) -> String {
    if line.len() <= MAX_LINE_LOG_LENGTH {
        return line.to_string();
    }
    let mut end = MAX_LINE_LOG_LENGTH;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &line[..end], line.len())
}
