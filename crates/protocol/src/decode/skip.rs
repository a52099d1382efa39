//! Reasons a line is dropped instead of routed

use std::fmt;

use thiserror::Error;

use crate::error::ProtocolError;
use crate::record::CategoryId;

/// Why a line produced no record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// Line does not carry the profile's header
    #[error("line does not match the framing profile")]
    Unframed,

    /// Identifier has no registry entry
    #[error("unknown identifier '{identifier}'")]
    UnknownIdentifier { identifier: String },

    /// Identifier is known but the line does not fit its schema
    #[error("malformed fields for {category}: {detail}")]
    MalformedFields {
        category: CategoryId,
        #[source]
        detail: ProtocolError,
    },
}

impl SkipReason {
    /// Create a malformed fields reason
    #[inline]
    pub fn malformed(category: CategoryId, detail: ProtocolError) -> Self {
        Self::MalformedFields { category, detail }
    }

    /// Fieldless discriminant, for counters
    #[inline]
    pub fn kind(&self) -> SkipKind {
        match self {
            Self::Unframed => SkipKind::Unframed,
            Self::UnknownIdentifier { .. } => SkipKind::UnknownIdentifier,
            Self::MalformedFields { .. } => SkipKind::MalformedFields,
        }
    }
}

/// Skip reason without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipKind {
    Unframed,
    UnknownIdentifier,
    MalformedFields,
}

impl SkipKind {
    /// All kinds, in counter order
    pub const ALL: [SkipKind; 3] = [
        SkipKind::Unframed,
        SkipKind::UnknownIdentifier,
        SkipKind::MalformedFields,
    ];

    /// Number of kinds
    pub const COUNT: usize = Self::ALL.len();

    /// Position in `ALL`, for indexing counter arrays
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Unframed => 0,
            Self::UnknownIdentifier => 1,
            Self::MalformedFields => 2,
        }
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unframed => "unframed",
            Self::UnknownIdentifier => "unknown_identifier",
            Self::MalformedFields => "malformed_fields",
        }
    }
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
