//! Identifier types
//!
//! `Identifier` names the origin of a raw line: the modem queue number for
//! vehicle traffic or the asset id for positioning fixes. The registry maps
//! it to a category.

use std::borrow::Borrow;
use std::fmt;

/// Queue or asset identifier used for category lookup
///
/// # Example
///
/// ```
/// use acomms_protocol::Identifier;
///
/// let queue = Identifier::new("34");
/// assert_eq!(queue.as_str(), "34");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Create a new identifier
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `HashMap<Identifier, _>` be queried with a borrowed `&str`
impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}
