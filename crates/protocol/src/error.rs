//! Protocol error types
//!
//! Errors raised while building schemas or parsing a payload against one.
//! Payload errors end up inside `SkipReason::MalformedFields`, so they are
//! cheap to clone and compare.

use thiserror::Error;

use crate::schema::FieldKind;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Payload has the wrong number of fields for the schema
    #[error("field count mismatch: expected {expected}, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    /// A payload field could not be parsed as its declared kind
    #[error("field '{field}' is not a valid {kind}: '{value}'")]
    InvalidField {
        field: String,
        kind: FieldKind,
        value: String,
    },

    /// Line header carried an empty or unusable timestamp
    #[error("invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// Unknown field kind in a field specification
    #[error("unknown field kind '{0}' (expected float, integer, token or timestamp)")]
    UnknownFieldKind(String),

    /// Field specification could not be parsed
    #[error("invalid field spec '{0}': expected 'name' or 'name:kind'")]
    InvalidFieldSpec(String),

    /// Same field name declared twice in one schema
    #[error("duplicate field name '{0}'")]
    DuplicateField(String),

    /// Schema declares no fields
    #[error("schema must declare at least one field")]
    EmptySchema,

    /// Separator specification could not be parsed
    #[error("invalid separator '{0}': expected 'comma', 'whitespace' or a single character")]
    InvalidSeparator(String),

    /// Trailing policy could not be parsed
    #[error("invalid trailing policy '{0}': expected 'reject' or 'ignore'")]
    InvalidTrailingPolicy(String),
}

impl ProtocolError {
    /// Create a field count error
    #[inline]
    pub fn field_count(expected: usize, actual: usize) -> Self {
        Self::FieldCount { expected, actual }
    }

    /// Create an invalid field error
    #[inline]
    pub fn invalid_field(field: impl Into<String>, kind: FieldKind, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            kind,
            value: value.into(),
        }
    }
}
