//! Registry error types

use acomms_protocol::ProtocolError;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while compiling the identifier registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Category registered twice
    #[error("duplicate category '{name}'")]
    DuplicateCategory { name: String },

    /// Identifier mapped to two categories
    #[error("identifier '{identifier}' is mapped by both '{first}' and '{second}'")]
    DuplicateIdentifier {
        identifier: String,
        first: String,
        second: String,
    },

    /// Identifier cannot be used with the active profile
    #[error("category '{category}' has invalid identifier '{identifier}': {message}")]
    InvalidIdentifier {
        category: String,
        identifier: String,
        message: String,
    },

    /// Category schema could not be built
    #[error("category '{category}' has an invalid schema: {source}")]
    InvalidSchema {
        category: String,
        #[source]
        source: ProtocolError,
    },

    /// Identifier mapped to a category that was never registered
    #[error("identifier '{identifier}' refers to an unregistered category")]
    UnknownCategory { identifier: String },

    /// Registry has no identifiers at all
    #[error("registry is empty - at least one identifier must be mapped")]
    Empty,

    /// More categories than `CategoryId` can address
    #[error("too many categories (max {max})")]
    TooManyCategories { max: usize },
}

impl RegistryError {
    /// Create a DuplicateIdentifier error
    #[inline]
    pub fn duplicate_identifier(
        identifier: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::DuplicateIdentifier {
            identifier: identifier.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an InvalidSchema error
    #[inline]
    pub fn invalid_schema(category: impl Into<String>, source: ProtocolError) -> Self {
        Self::InvalidSchema {
            category: category.into(),
            source,
        }
    }

    /// Create an InvalidIdentifier error
    #[inline]
    pub fn invalid_identifier(
        category: impl Into<String>,
        identifier: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            category: category.into(),
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}
