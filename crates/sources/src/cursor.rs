//! Restart cursor
//!
//! The cursor records how far the filter has consumed a raw log. It is stored
//! as JSON so operators can inspect or hand-edit it between runs.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "target": "/data/raw/sentry_raw.txt",
//!   "offset": 48213,
//!   "lines": 612
//! }
//! ```
//!
//! Writes go to a temporary file that is synced and then renamed over the
//! cursor file, so a crash leaves either the old or the new cursor.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use acomms_protocol::RawLine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CursorError;

/// File format version
const FORMAT_VERSION: u32 = 1;

/// Consumption state for one raw log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    target: PathBuf,
    offset: u64,
    lines: u64,
}

impl Cursor {
    /// Fresh cursor at the start of `target`
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self::at(target, 0, 0)
    }

    /// Cursor at a known position
    pub fn at(target: impl Into<PathBuf>, offset: u64, lines: u64) -> Self {
        Self {
            target: target.into(),
            offset,
            lines,
        }
    }

    #[inline]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Byte offset just past the last consumed line
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Lines consumed since the cursor was created
    #[inline]
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Mark `line` as consumed
    ///
    /// Lines must be committed in the order the reader yielded them.
    #[inline]
    pub fn commit(&mut self, line: &RawLine) {
        self.offset = line.end();
        self.lines += 1;
    }

    /// Move forward to `offset` without counting lines
    ///
    /// Used when the reader skipped existing content (start at end).
    #[inline]
    pub fn advance_to(&mut self, offset: u64) {
        self.offset = self.offset.max(offset);
    }

    /// Back to offset 0 after the raw log was reset
    #[inline]
    pub fn reset(&mut self) {
        self.offset = 0;
        self.lines = 0;
    }
}

/// Cursor file structure
#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    version: u32,
    target: PathBuf,
    offset: u64,
    lines: u64,
}

/// Loads and saves the cursor file
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let temp_path = path.with_extension("tmp");
        Self { path, temp_path }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cursor for `target`
    ///
    /// Returns `None` when no cursor file exists or it belongs to another
    /// target; the caller then starts fresh.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(&self, target: &Path) -> Result<Option<Cursor>, CursorError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CursorError::io(&self.path, e)),
        };

        let stored: CursorFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CursorError::format(&self.path, e))?;

        if stored.version != FORMAT_VERSION {
            warn!(
                path = %self.path.display(),
                expected = FORMAT_VERSION,
                found = stored.version,
                "cursor file version mismatch"
            );
        }

        if stored.target != target {
            warn!(
                path = %self.path.display(),
                cursor_target = %stored.target.display(),
                target = %target.display(),
                "cursor belongs to a different target, starting fresh"
            );
            return Ok(None);
        }

        debug!(
            path = %self.path.display(),
            offset = stored.offset,
            lines = stored.lines,
            "cursor loaded"
        );
        Ok(Some(Cursor::at(stored.target, stored.offset, stored.lines)))
    }

    /// Persist the cursor atomically
    ///
    /// # Errors
    ///
    /// Fails if the temporary file cannot be written, synced or renamed.
    pub fn save(&self, cursor: &Cursor) -> Result<(), CursorError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CursorError::io(parent, e))?;
        }

        let stored = CursorFile {
            version: FORMAT_VERSION,
            target: cursor.target.clone(),
            offset: cursor.offset,
            lines: cursor.lines,
        };

        let file = File::create(&self.temp_path).map_err(|e| CursorError::io(&self.temp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &stored)
            .map_err(|e| CursorError::format(&self.temp_path, e))?;
        writer
            .flush()
            .map_err(|e| CursorError::io(&self.temp_path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| CursorError::io(&self.temp_path, e))?;

        fs::rename(&self.temp_path, &self.path).map_err(|e| CursorError::io(&self.path, e))?;
        Ok(())
    }
}
