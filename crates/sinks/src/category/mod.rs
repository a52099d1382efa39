//! Category writer
//!
//! Owns one append-only stream per category, indexed by `CategoryId`.
//! Streams are opened lazily on the first record for their category, with
//! create+append so an earlier run's output is extended, never truncated.
//!
//! # Directory Structure
//!
//! ```text
//! output_dir/
//! ├── sentry_sentry_status.txt
//! ├── sentry_sentry_science.txt
//! └── sentry_experimental.txt
//! ```
//!
//! Every record is rendered into one reused buffer, appended with a single
//! `write_all` and flushed before `route` returns, so a consumer tailing the
//! file sees whole lines in arrival order.
//!
//! The writer tracks where each stream's last complete record ends. A stream
//! reopened after a failed write is cut back to that length first, so a
//! partially written record never stays in front of its retry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use acomms_protocol::{CategoryId, DecodedRecord};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::common::{Result, SinkError, WriterMetrics};
use crate::util::RateLimitedLogger;

/// Output file extension
const STREAM_EXTENSION: &str = "txt";

/// Configuration for the category writer
#[derive(Debug, Clone)]
pub struct CategoryWriterConfig {
    /// Directory holding the category files
    pub output_dir: PathBuf,

    /// File name prefix, usually the vehicle name; empty for none
    pub prefix: String,

    /// Call `sync_data` after every record
    pub durable: bool,
}

impl CategoryWriterConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: String::new(),
            durable: false,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_durable(mut self, durable: bool) -> Self {
        self.durable = durable;
        self
    }
}

/// Output path for a category: `{dir}/{prefix}_{category}.txt`
pub fn stream_path(output_dir: &Path, prefix: &str, category: &str) -> PathBuf {
    let file_name = if prefix.is_empty() {
        format!("{category}.{STREAM_EXTENSION}")
    } else {
        format!("{prefix}_{category}.{STREAM_EXTENSION}")
    };
    output_dir.join(file_name)
}

/// What happened to a routed record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Appended and flushed; carries the bytes written
    Written(usize),
    /// Category is disabled; the record was dropped
    Dropped,
}

/// State of one category's stream
#[derive(Debug)]
enum Slot {
    /// Not opened yet, or closed for a reopen
    Closed,
    Open(File),
    /// Failed twice; records are dropped
    Disabled,
}

/// Writes decoded records to their category files
pub struct CategoryWriter {
    config: CategoryWriterConfig,

    /// Category names indexed by `CategoryId`
    names: Vec<String>,

    /// Output paths indexed by `CategoryId`
    paths: Vec<PathBuf>,

    /// Streams indexed by `CategoryId`
    slots: Vec<Slot>,

    /// End of the last complete record per stream, once it has been opened
    ends: Vec<Option<u64>>,

    /// Reused render buffer
    line: String,

    /// First category that was disabled
    first_failure: Option<CategoryId>,

    /// Output directory already created
    dir_ready: bool,

    metrics: Arc<WriterMetrics>,
    error_logger: RateLimitedLogger,
}

impl CategoryWriter {
    /// Create a writer for `names`, where `names[i]` is category `i`
    pub fn new(config: CategoryWriterConfig, names: Vec<String>) -> Self {
        let paths = names
            .iter()
            .map(|name| stream_path(&config.output_dir, &config.prefix, name))
            .collect();
        let slots = names.iter().map(|_| Slot::Closed).collect();
        let ends = vec![None; names.len()];

        Self {
            config,
            names,
            paths,
            slots,
            ends,
            line: String::with_capacity(256),
            first_failure: None,
            dir_ready: false,
            metrics: Arc::new(WriterMetrics::new()),
            error_logger: RateLimitedLogger::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> &CategoryWriterConfig {
        &self.config
    }

    /// Output path of a category
    pub fn path(&self, category: CategoryId) -> Option<&Path> {
        self.paths.get(category.index()).map(PathBuf::as_path)
    }

    /// Name of a category
    pub fn name(&self, category: CategoryId) -> Option<&str> {
        self.names.get(category.index()).map(String::as_str)
    }

    /// True once a category has been disabled after repeated failures
    pub fn is_disabled(&self, category: CategoryId) -> bool {
        matches!(self.slots.get(category.index()), Some(Slot::Disabled))
    }

    /// Shared handle to the writer counters
    pub fn metrics(&self) -> Arc<WriterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Append `record` to its category stream
    ///
    /// A failed write is retried once on a freshly opened handle. If the
    /// retry fails too the category is disabled and the record dropped.
    ///
    /// # Errors
    ///
    /// - `SinkError::UnknownCategory` for a category outside the writer's table
    /// - `SinkError::Systemic` when a second distinct category fails
    pub async fn route(&mut self, record: &DecodedRecord) -> Result<Delivery> {
        let category = record.category();
        let index = category.index();
        if index >= self.slots.len() {
            return Err(SinkError::UnknownCategory { category });
        }

        if matches!(self.slots[index], Slot::Disabled) {
            self.metrics.record_dropped();
            return Ok(Delivery::Dropped);
        }

        record.write_line(&mut self.line);

        let first = match self.append(index).await {
            Ok(()) => return Ok(self.written()),
            Err(e) => e,
        };
        self.metrics.write_error();
        self.error_logger
            .error("category write failed, reopening stream", &first);

        self.slots[index] = Slot::Closed;
        match self.append(index).await {
            Ok(()) => Ok(self.written()),
            Err(e) => {
                self.metrics.write_error();
                self.disable(category, e)
            }
        }
    }

    /// Flush and sync every open stream
    ///
    /// All streams are attempted; the first error is returned.
    pub async fn flush_all(&mut self) -> Result<()> {
        let mut result = Ok(());

        for (slot, path) in self.slots.iter_mut().zip(&self.paths) {
            let Slot::Open(file) = slot else {
                continue;
            };
            let synced = match file.flush().await {
                Ok(()) => file.sync_data().await,
                Err(e) => Err(e),
            };
            if let Err(e) = synced {
                error!(path = %path.display(), error = %e, "failed to sync category stream");
                if result.is_ok() {
                    result = Err(SinkError::write(path, e));
                }
            }
        }

        result
    }

    fn written(&self) -> Delivery {
        let bytes = self.line.len();
        self.metrics.record_written(bytes as u64);
        Delivery::Written(bytes)
    }

    /// Write the rendered line to stream `index`, opening it if needed
    async fn append(&mut self, index: usize) -> Result<()> {
        if matches!(self.slots[index], Slot::Closed) {
            let file = self.open(index).await?;
            self.slots[index] = Slot::Open(file);
        }

        let path = &self.paths[index];
        let Slot::Open(file) = &mut self.slots[index] else {
            return Ok(());
        };

        file.write_all(self.line.as_bytes())
            .await
            .map_err(|e| SinkError::write(path, e))?;
        file.flush().await.map_err(|e| SinkError::write(path, e))?;
        if self.config.durable {
            file.sync_data()
                .await
                .map_err(|e| SinkError::write(path, e))?;
        }

        if let Some(end) = self.ends[index].as_mut() {
            *end += self.line.len() as u64;
        }
        Ok(())
    }

    async fn open(&mut self, index: usize) -> Result<File> {
        if !self.dir_ready {
            let dir = &self.config.output_dir;
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| SinkError::create(dir, e))?;
            }
            self.dir_ready = true;
        }

        let path = &self.paths[index];
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| SinkError::create(path, e))?;

        let len = file
            .metadata()
            .await
            .map_err(|e| SinkError::create(path, e))?
            .len();
        let end = match self.ends[index] {
            Some(end) if len > end => {
                file.set_len(end)
                    .await
                    .map_err(|e| SinkError::write(path, e))?;
                self.metrics.partial_trimmed();
                warn!(
                    category = %self.names[index],
                    removed = len - end,
                    "trimmed partial record before retry"
                );
                end
            }
            _ => len,
        };
        self.ends[index] = Some(end);

        self.metrics.stream_opened();
        debug!(category = %self.names[index], path = %path.display(), "category stream opened");
        Ok(file)
    }

    fn disable(&mut self, category: CategoryId, cause: SinkError) -> Result<Delivery> {
        let index = category.index();
        self.slots[index] = Slot::Disabled;
        self.metrics.category_disabled();

        match self.first_failure {
            None => {
                self.first_failure = Some(category);
                self.metrics.record_dropped();
                error!(
                    category = %self.names[index],
                    error = %cause,
                    "category disabled after failed retry, its records will be dropped"
                );
                Ok(Delivery::Dropped)
            }
            Some(first) => Err(SinkError::systemic(
                self.names[first.index()].clone(),
                self.names[index].clone(),
                cause,
            )),
        }
    }
}

#[cfg(test)]
#[path = "category_test.rs"]
mod category_test;
