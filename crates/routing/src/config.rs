//! Compile the registry and framing profile from configuration

use acomms_config::{CategoryConfig, Config, ProfileKind, TrailingMode};
use acomms_protocol::{
    FieldSpec, PositioningFraming, Profile, Schema, Separator, TrailingPolicy,
};

use crate::error::{RegistryError, Result};
use crate::registry::IdentifierRegistry;

/// Build the identifier registry from the `[categories.*]` tables
///
/// Categories receive ids in name order. With the vehicle profile, queue
/// identifiers are normalised to their decimal value so they match what the
/// decoder extracts from `SDQ <queue>:`.
///
/// # Errors
///
/// Returns an error for unparsable schemas, non-numeric vehicle queues,
/// identifiers claimed twice, or an empty table.
pub fn registry_from_config(config: &Config) -> Result<IdentifierRegistry> {
    let mut builder = IdentifierRegistry::builder();
    let vehicle = config.filter.profile == ProfileKind::Vehicle;

    for (name, category) in &config.categories {
        let schema = schema_from_config(name, category)?;
        let id = builder.add_category(name.as_str(), schema)?;

        for raw in &category.identifiers {
            let identifier = if vehicle {
                normalize_queue(name, raw)?
            } else {
                raw.trim().to_string()
            };
            builder.map(identifier, id)?;
        }
    }

    builder.build()
}

/// Build the framing profile selected by `[filter].profile`
pub fn profile_from_config(config: &Config) -> Profile {
    match config.filter.profile {
        ProfileKind::Vehicle => Profile::Vehicle,
        ProfileKind::Positioning => Profile::Positioning(PositioningFraming {
            record_tag: config.positioning.record_tag.clone(),
            solution_types: config
                .positioning
                .solution_types
                .iter()
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .collect(),
        }),
        ProfileKind::Delimited => Profile::Delimited {
            separator: config.filter.delimiter,
        },
    }
}

fn schema_from_config(name: &str, category: &CategoryConfig) -> Result<Schema> {
    let fields = category
        .fields
        .iter()
        .map(|f| f.parse::<FieldSpec>())
        .collect::<acomms_protocol::Result<Vec<_>>>()
        .map_err(|e| RegistryError::invalid_schema(name, e))?;

    let separator: Separator = category
        .separator
        .parse()
        .map_err(|e| RegistryError::invalid_schema(name, e))?;

    let trailing = match category.trailing {
        TrailingMode::Reject => TrailingPolicy::Reject,
        TrailingMode::Ignore => TrailingPolicy::Ignore,
    };

    Schema::new(fields, separator, trailing).map_err(|e| RegistryError::invalid_schema(name, e))
}

fn normalize_queue(category: &str, identifier: &str) -> Result<String> {
    identifier
        .trim()
        .parse::<u32>()
        .map(|queue| queue.to_string())
        .map_err(|_| {
            RegistryError::invalid_identifier(category, identifier, "vehicle queues must be numbers")
        })
}
