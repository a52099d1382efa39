//! Tailing reader
//!
//! Follows a raw log that another process keeps appending to and yields each
//! complete line exactly once per run.
//!
//! # Framing
//!
//! Lines end with LF; a CR before the LF is stripped. Bytes after the last LF
//! are kept in the pending buffer and only become a line once their LF is
//! written. Invalid UTF-8 is replaced, never rejected.
//!
//! # Positions
//!
//! - `position` - bytes read from the file so far (end of the pending buffer)
//! - `offset` - end of the last yielded line (start of the pending buffer)
//!
//! A cursor stores `offset`; resuming from it re-reads any partial tail.
//!
//! # Replacement
//!
//! Once a file has been opened, the reader remembers its identity. If the
//! path disappears and comes back, or names a different file on a later
//! poll, the reader reports `TailError::Replaced` instead of seeking into the
//! new file; the caller rewinds or stops.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use acomms_protocol::RawLine;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TailError;

// =============================================================================
// Constants
// =============================================================================

/// Default wait between polls of an idle file (250ms)
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Default read size (64KB)
const DEFAULT_READ_CHUNK: usize = 64 * 1024;

/// Block size used when scanning backwards for the last newline
const SCAN_BLOCK: u64 = 8 * 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Where a reader without a cursor starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartAt {
    /// Offset 0
    #[default]
    Beginning,
    /// Just past the last newline present when the file is first opened
    End,
}

/// Tailing reader configuration
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// Wait between polls when no complete line is available
    pub poll_interval: Duration,

    /// Start position when not resuming from a cursor
    pub start_at: StartAt,

    /// Maximum bytes requested per read
    pub read_chunk: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            start_at: StartAt::Beginning,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

// =============================================================================
// File identity
// =============================================================================

/// Device and inode of an opened file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId {
    dev: u64,
    ino: u64,
}

impl FileId {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

// =============================================================================
// Reader
// =============================================================================

/// Reader that follows a growing file line by line
pub struct TailReader {
    path: PathBuf,
    config: TailConfig,

    /// Open handle, dropped when the file goes missing
    file: Option<File>,

    /// Set once a file has been opened; survives the handle being dropped
    opened: bool,

    /// Identity of the opened file, where the platform provides one
    identity: Option<FileId>,

    /// The opened file disappeared from the path
    vanished: bool,

    /// Resolve `StartAt::End` on the next successful open
    seek_to_end: bool,

    /// Bytes read from the file
    position: u64,

    /// End of the last yielded line
    offset: u64,

    /// Bytes read but not yet yielded
    pending: Vec<u8>,

    /// Prefix of `pending` already known to contain no newline
    scanned: usize,

    /// Reusable read buffer
    chunk: Vec<u8>,

    /// Lines yielded in this run
    seq: u64,
}

impl TailReader {
    /// Create a reader honouring `config.start_at`
    pub fn new(path: impl Into<PathBuf>, config: TailConfig) -> Self {
        let seek_to_end = config.start_at == StartAt::End;
        Self::build(path.into(), config, 0, seek_to_end)
    }

    /// Create a reader that resumes at a committed offset
    pub fn resume(path: impl Into<PathBuf>, offset: u64, config: TailConfig) -> Self {
        Self::build(path.into(), config, offset, false)
    }

    fn build(path: PathBuf, config: TailConfig, offset: u64, seek_to_end: bool) -> Self {
        let chunk = vec![0; config.read_chunk.max(1)];
        Self {
            path,
            config,
            file: None,
            opened: false,
            identity: None,
            vanished: false,
            seek_to_end,
            position: offset,
            offset,
            pending: Vec::new(),
            scanned: 0,
            chunk,
            seq: 0,
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// End of the last yielded line
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes read from the file, including the unterminated tail
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes buffered after the last yielded line
    #[inline]
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Lines yielded in this run
    #[inline]
    pub fn lines_read(&self) -> u64 {
        self.seq
    }

    /// Next complete line, or `None` once `cancel` fires
    ///
    /// Waits in `poll_interval` steps while the file has no complete line.
    ///
    /// # Errors
    ///
    /// - `TailError::Missing` when the file cannot be opened; calling again retries
    /// - `TailError::Truncated` when the file shrank below `position`
    /// - `TailError::Replaced` when the path now names another file
    pub async fn next_line(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<RawLine>, TailError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }

            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }

            if self.fill().await? > 0 {
                continue;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(None),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Restart from offset 0, discarding buffered bytes
    pub fn rewind(&mut self) {
        debug!(path = %self.path.display(), from = self.offset, "rewinding raw log reader");
        self.file = None;
        self.opened = false;
        self.identity = None;
        self.vanished = false;
        self.seek_to_end = false;
        self.position = 0;
        self.offset = 0;
        self.pending.clear();
        self.scanned = 0;
    }

    /// Split the first complete line off the pending buffer
    fn take_line(&mut self) -> Option<RawLine> {
        let found = self.pending[self.scanned..].iter().position(|&b| b == b'\n');
        let Some(rel) = found else {
            self.scanned = self.pending.len();
            return None;
        };
        let newline = self.scanned + rel;

        let mut text_end = newline;
        if text_end > 0 && self.pending[text_end - 1] == b'\r' {
            text_end -= 1;
        }
        let text = String::from_utf8_lossy(&self.pending[..text_end]).into_owned();

        let start = self.offset;
        let end = start + newline as u64 + 1;
        self.pending.drain(..=newline);
        self.scanned = 0;
        self.offset = end;
        self.seq += 1;

        Some(RawLine::new(start, end, self.seq, text))
    }

    /// Read whatever the file has beyond `position`; returns bytes read
    async fn fill(&mut self) -> Result<usize, TailError> {
        // Path metadata, not the handle: catches removal and replacement
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) => {
                self.file = None;
                self.vanished |= self.opened && e.kind() == io::ErrorKind::NotFound;
                return Err(TailError::missing(&self.path, e));
            }
        };

        if self.is_replaced(&meta) {
            debug!(path = %self.path.display(), position = self.position, "raw log replaced");
            self.file = None;
            return Err(TailError::Replaced {
                position: self.position,
            });
        }

        let size = meta.len();

        if self.file.is_none() {
            self.open(size).await?;
        }

        if size < self.position {
            self.file = None;
            return Err(TailError::Truncated {
                position: self.position,
                size,
            });
        }
        if size == self.position {
            return Ok(0);
        }

        let want = ((size - self.position) as usize).min(self.chunk.len());
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        let n = file
            .read(&mut self.chunk[..want])
            .await
            .map_err(|e| TailError::io(&self.path, e))?;

        self.pending.extend_from_slice(&self.chunk[..n]);
        self.position += n as u64;
        Ok(n)
    }

    async fn open(&mut self, size: u64) -> Result<(), TailError> {
        let mut file = File::open(&self.path)
            .await
            .map_err(|e| TailError::missing(&self.path, e))?;

        if self.seek_to_end {
            let start = last_line_end(&mut file, size)
                .await
                .map_err(|e| TailError::io(&self.path, e))?;
            debug!(path = %self.path.display(), offset = start, "starting at end of raw log");
            self.position = start;
            self.offset = start;
            self.seek_to_end = false;
        }

        if self.position <= size {
            file.seek(SeekFrom::Start(self.position))
                .await
                .map_err(|e| TailError::io(&self.path, e))?;
        }

        let meta = file
            .metadata()
            .await
            .map_err(|e| TailError::io(&self.path, e))?;
        self.identity = FileId::of(&meta);
        self.opened = true;
        self.file = Some(file);
        Ok(())
    }

    /// Path no longer names the file that was opened
    fn is_replaced(&self, current: &Metadata) -> bool {
        if self.vanished {
            return true;
        }
        match (self.identity, FileId::of(current)) {
            (Some(opened), Some(now)) => opened != now,
            _ => false,
        }
    }
}

/// Offset just past the last newline in the first `size` bytes, or 0
async fn last_line_end(file: &mut File, size: u64) -> io::Result<u64> {
    let mut block = vec![0u8; SCAN_BLOCK as usize];
    let mut end = size;

    while end > 0 {
        let start = end.saturating_sub(SCAN_BLOCK);
        let len = (end - start) as usize;

        file.seek(SeekFrom::Start(start)).await?;
        file.read_exact(&mut block[..len]).await?;

        if let Some(pos) = block[..len].iter().rposition(|&b| b == b'\n') {
            return Ok(start + pos as u64 + 1);
        }
        end = start;
    }

    Ok(0)
}
