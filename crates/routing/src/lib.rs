//! acomms routing - identifier registry
//!
//! Pre-compiled table mapping queue numbers and asset ids to output categories
//! and their schemas.
//!
//! # Design
//!
//! The registry is built once from configuration before the filter starts and
//! never changes afterwards. Lookups are a single hash lookup that returns the
//! category id and a borrowed schema; category ids are dense so writers can
//! index their stream table directly.
//!
//! # Example
//!
//! ```
//! use acomms_protocol::{FieldKind, FieldSpec, Schema, Separator, TrailingPolicy};
//! use acomms_routing::IdentifierRegistry;
//!
//! let schema = Schema::new(
//!     vec![FieldSpec::new("temp", FieldKind::Float), FieldSpec::new("sal", FieldKind::Float)],
//!     Separator::Comma,
//!     TrailingPolicy::Reject,
//! )
//! .unwrap();
//!
//! let mut builder = IdentifierRegistry::builder();
//! let science = builder.add_category("science", schema).unwrap();
//! builder.map("Q1", science).unwrap();
//! let registry = builder.build().unwrap();
//!
//! let entry = registry.resolve("Q1").unwrap();
//! assert_eq!(entry.name(), "science");
//! assert!(registry.resolve("Q9").is_none());
//! ```

mod config;
mod error;
mod registry;


pub use config::{profile_from_config, registry_from_config};
pub use error::{RegistryError, Result};
pub use registry::{CategoryEntry, IdentifierRegistry, IdentifierRegistryBuilder};

// Re-export for convenience
pub use acomms_protocol::{CategoryId, Identifier};
