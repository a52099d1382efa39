//! Message decoder
//!
//! Turns a `RawLine` into a `DecodedRecord` in three steps:
//!
//! 1. **Framing** - the `Profile` splits the line into identifier, timestamp
//!    and payload (`framing`)
//! 2. **Lookup** - the identifier is resolved to a category and schema through
//!    `SchemaLookup`
//! 3. **Parsing** - the schema turns the payload into typed values
//!
//! Any failure is returned as a `SkipReason`; the caller counts it and moves on.
//!
//! # Usage
//!
//! ```ignore
//! let decoder = Decoder::new(Profile::Vehicle, registry);
//! match decoder.decode(&line) {
//!     Ok(record) => writer.route(&record)?,
//!     Err(reason) => metrics.record_skip(reason.kind()),
//! }
//! ```

mod framing;
mod skip;

use std::sync::Arc;

pub use framing::{Frame, PositioningFraming, Profile};
pub use skip::{SkipKind, SkipReason};

use crate::error::ProtocolError;
use crate::line::RawLine;
use crate::record::{CategoryId, DecodedRecord};
use crate::schema::Schema;

/// Read access to an identifier table
///
/// Implemented by the routing registry; kept as a trait so the decoder can be
/// tested against a plain map and this crate stays free of routing.
pub trait SchemaLookup {
    /// Resolve an identifier to its category and schema
    fn resolve(&self, identifier: &str) -> Option<(CategoryId, &Schema)>;

    /// Name of a category, for logging
    fn category_name(&self, category: CategoryId) -> Option<&str>;
}

impl<T: SchemaLookup + ?Sized> SchemaLookup for &T {
    fn resolve(&self, identifier: &str) -> Option<(CategoryId, &Schema)> {
        (**self).resolve(identifier)
    }

    fn category_name(&self, category: CategoryId) -> Option<&str> {
        (**self).category_name(category)
    }
}

impl<T: SchemaLookup + ?Sized> SchemaLookup for Arc<T> {
    fn resolve(&self, identifier: &str) -> Option<(CategoryId, &Schema)> {
        (**self).resolve(identifier)
    }

    fn category_name(&self, category: CategoryId) -> Option<&str> {
        (**self).category_name(category)
    }
}

/// Stateless line decoder for one framing profile
#[derive(Debug, Clone)]
pub struct Decoder<L> {
    profile: Profile,
    lookup: L,
}

impl<L: SchemaLookup> Decoder<L> {
    pub fn new(profile: Profile, lookup: L) -> Self {
        Self { profile, lookup }
    }

    #[inline]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[inline]
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Decode a raw line
    #[inline]
    pub fn decode(&self, line: &RawLine) -> Result<DecodedRecord, SkipReason> {
        self.decode_str(line.text())
    }

    /// Decode line text
    pub fn decode_str(&self, text: &str) -> Result<DecodedRecord, SkipReason> {
        let frame = self.profile.frame(text).ok_or(SkipReason::Unframed)?;

        let (category, schema) = self.lookup.resolve(&frame.identifier).ok_or_else(|| {
            SkipReason::UnknownIdentifier {
                identifier: frame.identifier.to_string(),
            }
        })?;

        // Header timestamps become the first output column
        let timestamp = frame.timestamp.trim();
        if timestamp.is_empty() || timestamp.contains(',') {
            return Err(SkipReason::malformed(
                category,
                ProtocolError::InvalidTimestamp(timestamp.to_string()),
            ));
        }

        let fields = schema
            .parse(&frame.payload)
            .map_err(|e| SkipReason::malformed(category, e))?;

        Ok(DecodedRecord::new(category, timestamp, fields))
    }
}
