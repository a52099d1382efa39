//! Raw lines read from the telemetry log

/// One complete line from the raw log
///
/// `start..end` is the byte span of the line in the source file, where `end`
/// is just past the terminating newline. The text excludes the terminator and
/// any trailing carriage return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    start: u64,
    end: u64,
    seq: u64,
    text: String,
}

impl RawLine {
    /// Create a new raw line
    pub fn new(start: u64, end: u64, seq: u64, text: impl Into<String>) -> Self {
        debug_assert!(start <= end);
        Self {
            start,
            end,
            seq,
            text: text.into(),
        }
    }

    /// Offset of the first byte of this line
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Offset just past the newline that terminated this line
    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Sequence number of this line within the current run (starting at 1)
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Line text without its terminator
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of bytes this line occupied in the file, terminator included
    #[inline]
    pub fn span_len(&self) -> u64 {
        self.end - self.start
    }

    /// True when the line carries nothing but whitespace
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
