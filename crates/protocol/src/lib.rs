//! acomms protocol - core types for the acoustic telemetry filter
//!
//! This crate provides the values that flow through a filter run:
//! - `RawLine` - one complete line read from the raw log, with its byte span
//! - `Identifier` - queue number (vehicle) or asset id (positioning)
//! - `Schema` / `FieldSpec` / `FieldKind` - the typed layout of a category payload
//! - `DecodedRecord` / `CategoryId` - a parsed line ready to be routed
//! - `Decoder` / `Profile` - framing and classification of raw lines
//!
//! # Design Principles
//!
//! - **Skips are values**: decoding returns `Result<DecodedRecord, SkipReason>`,
//!   a bad line never aborts a run
//! - **Pure decoding**: the decoder holds no mutable state, the same line and
//!   registry always produce the same result
//! - **Leaf crate**: the identifier table is reached through the `SchemaLookup`
//!   trait so this crate does not depend on the registry

mod decode;
mod error;
mod identifier;
mod line;
mod record;
mod schema;

pub use decode::{Decoder, Frame, PositioningFraming, Profile, SchemaLookup, SkipKind, SkipReason};
pub use error::ProtocolError;
pub use identifier::Identifier;
pub use line::RawLine;
pub use record::{CategoryId, DecodedRecord};
pub use schema::{FieldKind, FieldSpec, FieldValue, Schema, Separator, TrailingPolicy};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

// Test modules - only compiled during testing
#[cfg(test)]
mod identifier_test;
#[cfg(test)]
mod schema_test;
