//! Filter loop
//!
//! One sequential control path per raw log:
//!
//! ```text
//! TailReader ──line──> Decoder ──record──> CategoryWriter
//!     │                   │ skip                 │
//!     │                   └──> counters          │
//!     └───────────── Cursor::commit <────────────┘ ──> CursorStore::save
//! ```
//!
//! A line's end offset is committed and saved only after its record is
//! written, so a crash replays at most the line in flight (at-least-once).
//! Cancellation is observed only while waiting for the next line; a line that
//! has been read is always routed and checkpointed before the loop stops.

use std::sync::Arc;
use std::time::Duration;

use acomms_config::{Config, TruncatePolicy};
use acomms_protocol::{Decoder, Profile, RawLine, SchemaLookup, SkipKind, SkipReason};
use acomms_routing::{IdentifierRegistry, profile_from_config, registry_from_config};
use acomms_sinks::util::RateLimitedLogger;
use acomms_sinks::{CategoryWriter, CategoryWriterConfig, Delivery};
use acomms_sources::{Cursor, CursorStore, TailError, TailReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};
use crate::metrics::{FilterMetrics, FilterMetricsHandle, MetricsSnapshot};
use crate::settings::FilterSettings;

/// Continuous filter for one raw log
pub struct FilterLoop {
    settings: FilterSettings,
    reader: TailReader,
    decoder: Decoder<Arc<IdentifierRegistry>>,
    writer: CategoryWriter,
    cursor: Cursor,
    store: CursorStore,

    /// Category names indexed by `CategoryId`
    categories: Arc<[String]>,

    metrics: Arc<FilterMetrics>,
    skip_logger: RateLimitedLogger,
    source_logger: RateLimitedLogger,
}

impl FilterLoop {
    /// Build a filter from a validated configuration
    ///
    /// # Errors
    ///
    /// Fails on missing filter settings, an invalid registry or an
    /// unreadable cursor file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = FilterSettings::from_config(&config.filter)?;
        let registry = Arc::new(registry_from_config(config)?);
        Self::new(settings, registry, profile_from_config(config))
    }

    /// Build a filter from resolved parts
    ///
    /// Loads the cursor for `settings.target`; without one the reader starts
    /// at `settings.start_at`.
    ///
    /// # Errors
    ///
    /// Fails if the cursor file exists but cannot be read.
    pub fn new(
        settings: FilterSettings,
        registry: Arc<IdentifierRegistry>,
        profile: Profile,
    ) -> Result<Self> {
        let store = CursorStore::new(&settings.cursor_path);
        let loaded = store.load(&settings.target)?;

        let (cursor, reader) = match loaded {
            Some(cursor) => {
                let reader = TailReader::resume(
                    &settings.target,
                    cursor.offset(),
                    settings.tail_config(),
                );
                (cursor, reader)
            }
            None => (
                Cursor::new(&settings.target),
                TailReader::new(&settings.target, settings.tail_config()),
            ),
        };

        let names: Vec<String> = registry
            .category_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let writer_config = CategoryWriterConfig::new(&settings.output_dir)
            .with_prefix(settings.name.as_str())
            .with_durable(settings.durable);
        let writer = CategoryWriter::new(writer_config, names.clone());
        let metrics = FilterMetrics::with_writer(names.len(), writer.metrics());

        Ok(Self {
            reader,
            decoder: Decoder::new(profile, registry),
            writer,
            cursor,
            store,
            metrics: Arc::new(metrics),
            categories: names.into(),
            skip_logger: RateLimitedLogger::default(),
            source_logger: RateLimitedLogger::default(),
            settings,
        })
    }

    #[inline]
    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Cursor the run starts from
    #[inline]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    pub fn writer(&self) -> &CategoryWriter {
        &self.writer
    }

    /// Get a metrics handle for reporting
    ///
    /// The handle remains valid after `run()` consumes the loop.
    pub fn metrics_handle(&self) -> FilterMetricsHandle {
        FilterMetricsHandle::new(Arc::clone(&self.metrics), Arc::clone(&self.categories))
    }

    /// Run until `cancel` fires or a fatal error occurs
    ///
    /// On every exit the category streams are flushed, the cursor is saved
    /// and a summary is logged.
    ///
    /// # Errors
    ///
    /// - `PipelineError::Truncated` when the raw log shrank and the policy is `stop`
    /// - `PipelineError::Replaced` when the raw log was replaced and the policy is `stop`
    /// - `PipelineError::Sink` when a second category fails
    /// - `PipelineError::Cursor` when the cursor cannot be saved
    pub async fn run(mut self, cancel: CancellationToken) -> Result<MetricsSnapshot> {
        info!(
            raw_log = %self.settings.target.display(),
            output_dir = %self.settings.output_dir.display(),
            profile = self.decoder.profile().name(),
            categories = self.categories.len(),
            identifiers = self.decoder.lookup().identifier_count(),
            offset = self.cursor.offset(),
            lines = self.cursor.lines(),
            "filter starting"
        );

        let mut backoff = self.settings.poll_interval;
        let mut mid_line = false;

        let outcome = loop {
            match self.reader.next_line(&cancel).await {
                Ok(Some(line)) => {
                    backoff = self.settings.poll_interval;
                    if let Err(e) = self.process(&line).await {
                        mid_line = true;
                        break Err(e);
                    }
                }
                Ok(None) => break Ok(()),
                Err(TailError::Truncated { position, size }) => {
                    if let Err(e) = self.reset(PipelineError::Truncated { position, size }) {
                        break Err(e);
                    }
                }
                Err(TailError::Replaced { position }) => {
                    if let Err(e) = self.reset(PipelineError::Replaced { position }) {
                        break Err(e);
                    }
                }
                Err(e) => {
                    self.metrics.record_source_error();
                    let message = if e.is_missing() {
                        "raw log unavailable, retrying"
                    } else {
                        "raw log read failed, retrying"
                    };
                    self.source_logger.warn(message, &e);

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break Ok(()),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = next_backoff(backoff, self.settings.missing_backoff_max);
                }
            }
        };

        let shutdown = self.shutdown(!mid_line).await;
        let snapshot = self.metrics.snapshot();
        self.log_summary(&snapshot);

        match outcome.and(shutdown) {
            Ok(()) => Ok(snapshot),
            Err(e) => {
                error!(error = %e, "filter failed");
                Err(e)
            }
        }
    }

    /// Decode, route and checkpoint one line
    async fn process(&mut self, line: &RawLine) -> Result<()> {
        self.metrics.record_line();

        if line.is_blank() {
            self.metrics.record_blank();
        } else {
            match self.decoder.decode(line) {
                Ok(record) => match self.writer.route(&record).await? {
                    Delivery::Written(_) => self.metrics.record_routed(record.category()),
                    Delivery::Dropped => self.metrics.record_write_failure(),
                },
                Err(reason) => {
                    self.metrics.record_skip(reason.kind());
                    match &reason {
                        SkipReason::Unframed => {
                            debug!(seq = line.seq(), "line does not match the framing profile");
                        }
                        SkipReason::MalformedFields { category, detail } => {
                            let lookup = self.decoder.lookup();
                            let name = lookup.category_name(*category).unwrap_or("?");
                            self.skip_logger.warn_with_line(
                                "line skipped",
                                &format_args!("malformed fields for {name}: {detail}"),
                                line.text(),
                            );
                        }
                        SkipReason::UnknownIdentifier { .. } => {
                            self.skip_logger.warn_with_line("line skipped", &reason, line.text());
                        }
                    }
                }
            }
        }

        self.cursor.commit(line);
        self.checkpoint()
    }

    /// Apply the truncate policy to a raw log that no longer continues from
    /// the cursor; `stop` is returned when the policy ends the run
    fn reset(&mut self, stop: PipelineError) -> Result<()> {
        match self.settings.on_truncate {
            TruncatePolicy::Stop => Err(stop),
            TruncatePolicy::Rewind => {
                warn!(reason = %stop, "rewinding to the start of the raw log");
                self.reader.rewind();
                self.cursor.reset();
                self.metrics.record_rewind();
                self.checkpoint()
            }
        }
    }

    fn checkpoint(&mut self) -> Result<()> {
        self.store.save(&self.cursor)?;
        self.metrics.record_checkpoint();
        Ok(())
    }

    /// Flush outputs and save the final cursor
    ///
    /// `settled` is false when the last line read was not routed; the cursor
    /// then stays before it so the next run replays it.
    async fn shutdown(&mut self, settled: bool) -> Result<()> {
        if settled {
            // Covers content skipped by starting at the end
            self.cursor.advance_to(self.reader.offset());
        }

        let flushed = self.writer.flush_all().await;
        let saved = self.checkpoint();

        flushed?;
        saved
    }

    fn log_summary(&self, snapshot: &MetricsSnapshot) {
        info!(
            lines = snapshot.lines_processed,
            blank = snapshot.blank_lines,
            routed = snapshot.routed_total(),
            unframed = snapshot.skipped(SkipKind::Unframed),
            unknown_identifier = snapshot.skipped(SkipKind::UnknownIdentifier),
            malformed_fields = snapshot.skipped(SkipKind::MalformedFields),
            write_failures = snapshot.write_failures,
            source_errors = snapshot.source_errors,
            rewinds = snapshot.rewinds,
            bytes_written = snapshot.writer.bytes_written,
            write_errors = snapshot.writer.write_errors,
            categories_disabled = snapshot.writer.categories_disabled,
            partials_trimmed = snapshot.writer.partials_trimmed,
            offset = self.cursor.offset(),
            "filter stopped"
        );

        for (name, routed) in self.categories.iter().zip(&snapshot.routed) {
            debug!(category = %name, routed, "category total");
        }
    }
}

/// Double the wait, capped at `max`
fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}
