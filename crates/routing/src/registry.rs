//! Identifier registry
//!
//! Compiled once at startup. All allocations happen while building; lookups
//! on the hot path only hash the identifier.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use acomms_protocol::{CategoryId, Identifier, Schema, SchemaLookup};

use crate::error::{RegistryError, Result};

/// One output category: its dense id, name and payload schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    id: CategoryId,
    name: String,
    schema: Schema,
}

impl CategoryEntry {
    #[inline]
    pub fn id(&self) -> CategoryId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Immutable identifier → category table
///
/// # Example
///
/// ```
/// use acomms_protocol::{FieldKind, FieldSpec, Schema, Separator, TrailingPolicy};
/// use acomms_routing::{CategoryId, IdentifierRegistry};
///
/// let schema = Schema::new(
///     vec![FieldSpec::new("depth", FieldKind::Float)],
///     Separator::Comma,
///     TrailingPolicy::Reject,
/// )
/// .unwrap();
///
/// let mut builder = IdentifierRegistry::builder();
/// let status = builder.add_category("sentry_status", schema).unwrap();
/// builder.map("0", status).unwrap();
/// let registry = builder.build().unwrap();
///
/// assert_eq!(registry.category_count(), 1);
/// assert_eq!(registry.resolve("0").map(|e| e.id()), Some(CategoryId::new(0)));
/// ```
#[derive(Debug, Clone)]
pub struct IdentifierRegistry {
    /// Identifier → category id
    routes: HashMap<Identifier, CategoryId>,

    /// Categories indexed by `CategoryId`
    categories: Vec<CategoryEntry>,
}

impl IdentifierRegistry {
    /// Start building a registry
    #[inline]
    #[must_use]
    pub fn builder() -> IdentifierRegistryBuilder {
        IdentifierRegistryBuilder::default()
    }

    /// Look up the category for an identifier
    #[inline]
    pub fn resolve(&self, identifier: &str) -> Option<&CategoryEntry> {
        self.routes
            .get(identifier)
            .and_then(|id| self.categories.get(id.index()))
    }

    /// Get a category by id
    #[inline]
    pub fn category(&self, id: CategoryId) -> Option<&CategoryEntry> {
        self.categories.get(id.index())
    }

    /// All categories in id order
    #[inline]
    pub fn categories(&self) -> &[CategoryEntry] {
        &self.categories
    }

    /// Category names in id order
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(CategoryEntry::name).collect()
    }

    #[inline]
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    #[inline]
    pub fn identifier_count(&self) -> usize {
        self.routes.len()
    }

    /// Identifiers mapped to a category, sorted
    pub fn identifiers_for(&self, id: CategoryId) -> Vec<&Identifier> {
        let mut identifiers: Vec<&Identifier> = self
            .routes
            .iter()
            .filter(|(_, category)| **category == id)
            .map(|(identifier, _)| identifier)
            .collect();
        identifiers.sort();
        identifiers
    }
}

impl SchemaLookup for IdentifierRegistry {
    #[inline]
    fn resolve(&self, identifier: &str) -> Option<(CategoryId, &Schema)> {
        IdentifierRegistry::resolve(self, identifier).map(|entry| (entry.id, &entry.schema))
    }

    #[inline]
    fn category_name(&self, category: CategoryId) -> Option<&str> {
        self.category(category).map(CategoryEntry::name)
    }
}

/// Builder for the identifier registry
///
/// Categories are registered first and receive sequential ids; identifiers are
/// then mapped onto them. Every conflict is reported instead of silently
/// replacing an earlier mapping.
#[derive(Debug, Default)]
pub struct IdentifierRegistryBuilder {
    categories: Vec<CategoryEntry>,
    category_ids: HashMap<String, CategoryId>,
    routes: HashMap<Identifier, CategoryId>,
}

impl IdentifierRegistryBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category and get its id
    ///
    /// # Errors
    ///
    /// Fails if the name is already registered or ids are exhausted.
    pub fn add_category(&mut self, name: impl Into<String>, schema: Schema) -> Result<CategoryId> {
        let name = name.into();
        if self.category_ids.contains_key(&name) {
            return Err(RegistryError::DuplicateCategory { name });
        }

        let index = u16::try_from(self.categories.len()).map_err(|_| {
            RegistryError::TooManyCategories {
                max: u16::MAX as usize,
            }
        })?;
        let id = CategoryId::new(index);

        self.category_ids.insert(name.clone(), id);
        self.categories.push(CategoryEntry { id, name, schema });
        Ok(id)
    }

    /// Get the id of a registered category
    #[inline]
    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.category_ids.get(name).copied()
    }

    /// Map an identifier to a registered category
    ///
    /// # Errors
    ///
    /// Fails if the category is unknown or the identifier is already mapped.
    pub fn map(&mut self, identifier: impl Into<Identifier>, category: CategoryId) -> Result<()> {
        let identifier = identifier.into();

        let Some(second) = self.categories.get(category.index()) else {
            return Err(RegistryError::UnknownCategory {
                identifier: identifier.to_string(),
            });
        };

        match self.routes.entry(identifier) {
            Entry::Occupied(existing) => {
                let first = &self.categories[existing.get().index()];
                Err(RegistryError::duplicate_identifier(
                    existing.key().as_str(),
                    first.name(),
                    second.name(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(category);
                Ok(())
            }
        }
    }

    /// Build the registry
    ///
    /// # Errors
    ///
    /// Fails if no identifier was mapped.
    pub fn build(self) -> Result<IdentifierRegistry> {
        if self.routes.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(IdentifierRegistry {
            routes: self.routes,
            categories: self.categories,
        })
    }
}
