//! acomms sources - tailing the raw telemetry log
//!
//! The external listener appends every acoustic message it receives to a raw
//! log. This crate follows that file while it grows:
//!
//! - **`TailReader`** - yields complete new lines with their byte spans, polls
//!   while the file is idle, reports a missing or truncated file as a typed error
//! - **`Cursor`** - how far the filter has consumed the log
//! - **`CursorStore`** - persists the cursor atomically so a restarted filter
//!   resumes where the previous run stopped
//!
//! # Design Principles
//!
//! - **Whole lines only**: bytes after the last newline stay buffered and are
//!   never yielded until their terminator arrives
//! - **Caller commits**: the reader never moves the cursor, the filter loop
//!   commits a line only after routing it
//! - **Prompt cancellation**: the only wait is a `tokio::select!` between the
//!   cancellation token and a bounded poll sleep
//!
//! # Example
//!
//! ```ignore
//! use acomms_sources::{TailConfig, TailReader};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let mut reader = TailReader::new("raw_dive.txt", TailConfig::default());
//! while let Some(line) = reader.next_line(&cancel).await? {
//!     println!("{}: {}", line.seq(), line.text());
//! }
//! ```

mod cursor;
mod error;
mod tail;

pub use cursor::{Cursor, CursorStore};
pub use error::{CursorError, TailError};
pub use tail::{StartAt, TailConfig, TailReader};

#[cfg(test)]
mod tail_test;
