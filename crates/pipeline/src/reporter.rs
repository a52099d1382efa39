//! Periodic stats reporter
//!
//! Logs one line of filter counters every `[metrics].interval`, with the
//! change since the previous report. Runs as its own task and only reads the
//! atomics behind a `FilterMetricsHandle`.

use std::time::Duration;

use acomms_config::MetricsConfig;
use acomms_protocol::SkipKind;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metrics::{FilterMetricsHandle, MetricsSnapshot};

/// Stats reporter for one filter
pub struct StatsReporter {
    handle: FilterMetricsHandle,
    enabled: bool,
    interval: Duration,
    previous: MetricsSnapshot,
}

impl StatsReporter {
    pub fn new(handle: FilterMetricsHandle, config: &MetricsConfig) -> Self {
        Self {
            handle,
            enabled: config.enabled,
            interval: config.interval,
            previous: MetricsSnapshot::default(),
        }
    }

    /// Run the reporter until cancellation
    ///
    /// Spawn this as a tokio task next to the filter loop.
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.enabled || self.interval.is_zero() {
            info!("stats reporting disabled");
            return;
        }

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        debug!(interval = ?self.interval, "stats reporter started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.report();
                }
            }
        }
    }

    /// Log the current counters and return the change since the last report
    pub fn report(&mut self) -> MetricsSnapshot {
        let current = self.handle.snapshot();
        let delta = current.diff(&self.previous);

        info!(
            lines = current.lines_processed,
            lines_delta = delta.lines_processed,
            routed = current.routed_total(),
            routed_delta = delta.routed_total(),
            skipped = current.skipped_total(),
            skipped_delta = delta.skipped_total(),
            unknown_identifier = current.skipped(SkipKind::UnknownIdentifier),
            malformed_fields = current.skipped(SkipKind::MalformedFields),
            write_failures = current.write_failures,
            source_errors = current.source_errors,
            rewinds = current.rewinds,
            bytes_written = current.writer.bytes_written,
            write_errors = current.writer.write_errors,
            write_errors_delta = delta.writer.write_errors,
            streams_opened = current.writer.streams_opened,
            categories_disabled = current.writer.categories_disabled,
            partials_trimmed = current.writer.partials_trimmed,
            "filter stats"
        );

        for (name, routed) in self.handle.categories().iter().zip(&delta.routed) {
            if *routed > 0 {
                debug!(category = %name, routed, "category activity");
            }
        }

        self.previous = current;
        delta
    }
}
