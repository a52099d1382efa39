//! Category table
//!
//! Each `[categories.<name>]` table becomes one output stream and one set of
//! registry entries. Field lists use `"name:kind"` strings so a category reads
//! like the column header of its output file.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// Field kinds accepted in `fields` entries (case-insensitive)
pub const KNOWN_FIELD_KINDS: &[&str] = &[
    "float",
    "f64",
    "integer",
    "int",
    "i64",
    "token",
    "text",
    "timestamp",
    "time",
];

/// Check whether a field kind name is known
pub fn is_known_field_kind(kind: &str) -> bool {
    let kind = kind.trim().to_ascii_lowercase();
    KNOWN_FIELD_KINDS.contains(&kind.as_str())
}

/// Categories keyed by name, iterated in name order
pub type CategoriesConfig = BTreeMap<String, CategoryConfig>;

/// What to do with payload fields beyond the declared ones
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrailingMode {
    #[default]
    Reject,
    Ignore,
}

impl TrailingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Ignore => "ignore",
        }
    }
}

/// One category
///
/// # Example
///
/// ```toml
/// [categories.sentry_science]
/// identifiers = [34]
/// separator = "whitespace"
/// fields = ["oxygen_concentration", "obs_raw", "orp_raw"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Queue numbers or asset ids routed to this category
    #[serde(deserialize_with = "deserialize_identifiers")]
    pub identifiers: Vec<String>,

    /// `comma`, `whitespace`, `tab` or a single character
    /// Default: comma
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Default: reject
    #[serde(default)]
    pub trailing: TrailingMode,

    /// Ordered `name` or `name:kind` entries; kind defaults to float
    pub fields: Vec<String>,
}

fn default_separator() -> String {
    "comma".into()
}

/// Accepts identifiers written as strings or bare integers
fn deserialize_identifiers<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawIdentifier {
        Text(String),
        Number(u64),
    }

    let raw = Vec::<RawIdentifier>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|id| match id {
            RawIdentifier::Text(s) => s,
            RawIdentifier::Number(n) => n.to_string(),
        })
        .collect())
}
