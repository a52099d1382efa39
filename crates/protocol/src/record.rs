//! Decoded records and category identifiers

use std::fmt::{self, Write};

use crate::schema::FieldValue;

/// Category identifier
///
/// Dense index assigned by the registry at build time. Category writers use
/// it to index their stream table directly instead of hashing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(u16);

impl CategoryId {
    /// Create a new category ID
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Get as usize for indexing into vectors
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category:{}", self.0)
    }
}

impl From<u16> for CategoryId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

/// A line that passed framing, lookup and schema parsing
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    category: CategoryId,
    timestamp: String,
    fields: Vec<FieldValue>,
}

impl DecodedRecord {
    pub fn new(category: CategoryId, timestamp: impl Into<String>, fields: Vec<FieldValue>) -> Self {
        Self {
            category,
            timestamp: timestamp.into(),
            fields,
        }
    }

    #[inline]
    pub fn category(&self) -> CategoryId {
        self.category
    }

    /// Timestamp text taken verbatim from the line header
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Field values in schema order
    #[inline]
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    /// Render the output line `timestamp,f1,f2,...\n` into `buf`
    ///
    /// The buffer is cleared first so callers can reuse one allocation.
    pub fn write_line(&self, buf: &mut String) {
        buf.clear();
        buf.push_str(&self.timestamp);
        for value in &self.fields {
            // Writing into a String cannot fail
            let _ = write!(buf, ",{value}");
        }
        buf.push('\n');
    }

    /// Output line as an owned string
    pub fn to_line(&self) -> String {
        let mut buf = String::with_capacity(self.timestamp.len() + self.fields.len() * 12);
        self.write_line(&mut buf);
        buf
    }
}
