//! Configuration validation
//!
//! Validates config consistency:
//! - At least one category is configured
//! - Category names are usable in file names
//! - Every category has identifiers and well-formed field entries
//! - No identifier is claimed by two categories
//! - Vehicle identifiers are queue numbers
//! - Filter timings and names are sane

use std::collections::HashMap;

use crate::Config;
use crate::categories::{CategoryConfig, is_known_field_kind};
use crate::error::{ConfigError, Result};
use crate::filter::ProfileKind;

/// Separator names accepted besides a single character
const NAMED_SEPARATORS: &[&str] = &["comma", "whitespace", "space", "tab"];

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_filter(config)?;
    validate_positioning(config)?;
    validate_categories(config)?;
    Ok(())
}

/// Validate filter settings
fn validate_filter(config: &Config) -> Result<()> {
    let filter = &config.filter;

    if filter.name.contains(['/', '\\']) {
        return Err(ConfigError::invalid_value(
            "filter",
            &filter.name,
            "name",
            "must not contain path separators",
        ));
    }

    if let Some(target) = &filter.target
        && target.as_os_str().is_empty()
    {
        return Err(ConfigError::invalid_value("filter", "filter", "target", "must not be empty"));
    }

    if filter.poll_interval.is_zero() {
        return Err(ConfigError::invalid_value(
            "filter",
            "filter",
            "poll_interval",
            "must be greater than zero",
        ));
    }

    if filter.missing_backoff_max < filter.poll_interval {
        return Err(ConfigError::invalid_value(
            "filter",
            "filter",
            "missing_backoff_max",
            "must be at least poll_interval",
        ));
    }

    if filter.profile == ProfileKind::Delimited
        && (filter.delimiter == '\n' || filter.delimiter == '\r')
    {
        return Err(ConfigError::invalid_value(
            "filter",
            "filter",
            "delimiter",
            "must not be a line terminator",
        ));
    }

    Ok(())
}

/// Validate positioning header settings (only when that profile is active)
fn validate_positioning(config: &Config) -> Result<()> {
    if config.filter.profile != ProfileKind::Positioning {
        return Ok(());
    }

    let positioning = &config.positioning;
    if positioning.record_tag.trim().is_empty() {
        return Err(ConfigError::missing_field("positioning", "positioning", "record_tag"));
    }
    if positioning.solution_types.iter().all(|s| s.trim().is_empty()) {
        return Err(ConfigError::missing_field(
            "positioning",
            "positioning",
            "solution_types",
        ));
    }

    Ok(())
}

/// Validate category tables and their identifiers
fn validate_categories(config: &Config) -> Result<()> {
    if config.categories.is_empty() {
        return Err(ConfigError::NoCategories);
    }

    // identifier (normalised) -> owning category
    let mut owners: HashMap<String, &str> = HashMap::new();

    for (name, category) in &config.categories {
        validate_category_name(name)?;
        validate_category(name, category)?;

        for identifier in &category.identifiers {
            let key = match config.filter.profile {
                ProfileKind::Vehicle => normalize_queue(name, identifier)?,
                _ => identifier.trim().to_string(),
            };

            if let Some(first) = owners.insert(key, name) {
                return Err(ConfigError::duplicate_identifier(identifier, first, name));
            }
        }
    }

    Ok(())
}

fn validate_category_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            "category",
            name,
            "name",
            "only letters, digits, '_' and '-' are allowed",
        ))
    }
}

fn validate_category(name: &str, category: &CategoryConfig) -> Result<()> {
    if category.identifiers.is_empty() {
        return Err(ConfigError::missing_field("category", name, "identifiers"));
    }
    if category.identifiers.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::invalid_value(
            "category",
            name,
            "identifiers",
            "identifiers must not be empty",
        ));
    }

    if category.fields.is_empty() {
        return Err(ConfigError::missing_field("category", name, "fields"));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(category.fields.len());
    for field in &category.fields {
        let (field_name, kind) = match field.split_once(':') {
            Some((n, k)) => (n.trim(), Some(k)),
            None => (field.trim(), None),
        };

        if field_name.is_empty() {
            return Err(ConfigError::invalid_value(
                "category",
                name,
                "fields",
                format!("entry '{field}' has no field name"),
            ));
        }
        if let Some(kind) = kind
            && !is_known_field_kind(kind)
        {
            return Err(ConfigError::invalid_value(
                "category",
                name,
                "fields",
                format!("unknown field kind '{}' in '{field}'", kind.trim()),
            ));
        }
        if seen.contains(&field_name) {
            return Err(ConfigError::invalid_value(
                "category",
                name,
                "fields",
                format!("duplicate field name '{field_name}'"),
            ));
        }
        seen.push(field_name);
    }

    let separator = category.separator.as_str();
    if !NAMED_SEPARATORS.contains(&separator) && separator.chars().count() != 1 {
        return Err(ConfigError::invalid_value(
            "category",
            name,
            "separator",
            format!("'{separator}' is neither a named separator nor a single character"),
        ));
    }

    Ok(())
}

/// Vehicle queues are matched by number, so "034" and "34" collide
fn normalize_queue(category: &str, identifier: &str) -> Result<String> {
    identifier
        .trim()
        .parse::<u32>()
        .map(|queue| queue.to_string())
        .map_err(|_| {
            ConfigError::invalid_value(
                "category",
                category,
                "identifiers",
                format!("vehicle queue '{identifier}' is not a number"),
            )
        })
}
