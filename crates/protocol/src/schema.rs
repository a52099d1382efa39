//! Category schemas
//!
//! A `Schema` describes the payload of one category: how the payload is split,
//! the ordered typed fields, and what happens to surplus fields. Schemas are
//! built once from configuration and never change during a run, so every
//! record of a category has the same column count and order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, NaiveTime};

use crate::error::ProtocolError;

/// Timestamp layouts accepted by `FieldKind::Timestamp`
///
/// Listener headers, navigation fixes and the SAGE instrument clock.
const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
];

/// Type of a single payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Finite 64-bit float
    Float,
    /// Signed 64-bit integer
    Integer,
    /// Non-empty opaque text
    Token,
    /// Date/time text in one of the known layouts, kept verbatim
    Timestamp,
}

impl FieldKind {
    /// Get the configuration name of this kind
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Token => "token",
            Self::Timestamp => "timestamp",
        }
    }

    /// Parse one raw payload field as this kind
    ///
    /// Returns `None` when the text is not a valid value of the kind.
    pub fn parse_value(self, raw: &str) -> Option<FieldValue> {
        match self {
            Self::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float),
            Self::Integer => raw.parse::<i64>().ok().map(FieldValue::Integer),
            Self::Token => {
                if raw.is_empty() || raw.contains(',') {
                    None
                } else {
                    Some(FieldValue::Token(raw.to_string()))
                }
            }
            Self::Timestamp => {
                if is_timestamp(raw) && !raw.contains(',') {
                    Some(FieldValue::Timestamp(raw.to_string()))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" | "f64" => Ok(Self::Float),
            "integer" | "int" | "i64" => Ok(Self::Integer),
            "token" | "text" => Ok(Self::Token),
            "timestamp" | "time" => Ok(Self::Timestamp),
            _ => Err(ProtocolError::UnknownFieldKind(s.to_string())),
        }
    }
}

/// Check whether text matches one of the known timestamp layouts
pub(crate) fn is_timestamp(raw: &str) -> bool {
    if DateTime::parse_from_rfc3339(raw).is_ok() {
        return true;
    }
    if TIMESTAMP_LAYOUTS
        .iter()
        .any(|layout| NaiveDateTime::parse_from_str(raw, layout).is_ok())
    {
        return true;
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f").is_ok()
}

/// A parsed payload value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Token(String),
    Timestamp(String),
}

impl FieldValue {
    /// Kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Float(_) => FieldKind::Float,
            Self::Integer(_) => FieldKind::Integer,
            Self::Token(_) => FieldKind::Token,
            Self::Timestamp(_) => FieldKind::Timestamp,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{}` on f64 is the shortest text that round-trips
            Self::Float(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Token(s) | Self::Timestamp(s) => f.write_str(s),
        }
    }
}

/// Named, typed payload field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Create a new field spec
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Parses `name` (a float field) or `name:kind`
impl FromStr for FieldSpec {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, kind) = match s.split_once(':') {
            Some((name, kind)) => (name.trim(), kind.parse()?),
            None => (s.trim(), FieldKind::Float),
        };

        let valid_name = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(ProtocolError::InvalidFieldSpec(s.to_string()));
        }

        Ok(Self::new(name, kind))
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}

/// How a payload is split into fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    /// `,` with surrounding whitespace trimmed from each field
    #[default]
    Comma,
    /// Runs of whitespace
    Whitespace,
    /// Any other single character, fields trimmed
    Char(char),
}

impl Separator {
    /// Split a payload into raw field texts
    pub fn split<'a>(self, payload: &'a str) -> Vec<&'a str> {
        match self {
            Self::Whitespace => payload.split_whitespace().collect(),
            Self::Comma => split_trimmed(payload, ','),
            Self::Char(c) => split_trimmed(payload, c),
        }
    }
}

fn split_trimmed(payload: &str, sep: char) -> Vec<&str> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }
    payload.split(sep).map(str::trim).collect()
}

impl FromStr for Separator {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comma" | "," => return Ok(Self::Comma),
            "whitespace" | "space" | " " => return Ok(Self::Whitespace),
            "tab" => return Ok(Self::Char('\t')),
            _ => {}
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_whitespace() => Ok(Self::Whitespace),
            (Some(c), None) => Ok(Self::Char(c)),
            _ => Err(ProtocolError::InvalidSeparator(s.to_string())),
        }
    }
}

/// What to do when a payload carries more fields than the schema declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingPolicy {
    /// Surplus fields make the line malformed
    #[default]
    Reject,
    /// Surplus fields are dropped
    Ignore,
}

impl FromStr for TrailingPolicy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            _ => Err(ProtocolError::InvalidTrailingPolicy(s.to_string())),
        }
    }
}

/// Ordered, typed layout of a category payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
    separator: Separator,
    trailing: TrailingPolicy,
}

impl Schema {
    /// Create a schema
    ///
    /// Fails when no fields are declared or a field name repeats.
    pub fn new(
        fields: Vec<FieldSpec>,
        separator: Separator,
        trailing: TrailingPolicy,
    ) -> crate::Result<Self> {
        if fields.is_empty() {
            return Err(ProtocolError::EmptySchema);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ProtocolError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Self {
            fields,
            separator,
            trailing,
        })
    }

    /// Declared fields in column order
    #[inline]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Number of declared fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false, a schema has at least one field
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[inline]
    pub fn separator(&self) -> Separator {
        self.separator
    }

    #[inline]
    pub fn trailing(&self) -> TrailingPolicy {
        self.trailing
    }

    /// Parse a payload into values, one per declared field
    pub fn parse(&self, payload: &str) -> crate::Result<Vec<FieldValue>> {
        let raw = self.separator.split(payload);

        let arity_ok = match self.trailing {
            TrailingPolicy::Reject => raw.len() == self.fields.len(),
            TrailingPolicy::Ignore => raw.len() >= self.fields.len(),
        };
        if !arity_ok {
            return Err(ProtocolError::field_count(self.fields.len(), raw.len()));
        }

        self.fields
            .iter()
            .zip(raw)
            .map(|(spec, text)| {
                spec.kind
                    .parse_value(text)
                    .ok_or_else(|| ProtocolError::invalid_field(&spec.name, spec.kind, text))
            })
            .collect()
    }
}
