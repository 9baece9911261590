//! Schema type definitions
//!
//! - `EntityType`: stable token identifying an entity type
//! - `Format`: declared value formats
//! - `ViewPattern`: view-match patterns
//! - `Converter`: per-column value conversion

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Stable token identifying an entity type.
///
/// Registry lookups are keyed by this token, so two tokens with the same
/// name refer to the same entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityType(&'static str);

impl EntityType {
    /// Create a type token
    pub const fn named(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the type name
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared value formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    Id,
    Null,
    Binary,
    Boolean,
    Integer,
    Decimal,
    Number,
    String,
    Enumeration,
    Pattern,
    Timestamp,
    Date,
    Array,
    Map,
    Object,
}

impl Format {
    /// Returns the format name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            Format::Id => "ID",
            Format::Null => "NULL",
            Format::Binary => "BINARY",
            Format::Boolean => "BOOLEAN",
            Format::Integer => "INTEGER",
            Format::Decimal => "DECIMAL",
            Format::Number => "NUMBER",
            Format::String => "STRING",
            Format::Enumeration => "ENUMERATION",
            Format::Pattern => "PATTERN",
            Format::Timestamp => "TIMESTAMP",
            Format::Date => "DATE",
            Format::Array => "ARRAY",
            Format::Map => "MAP",
            Format::Object => "OBJECT",
        }
    }

    /// Returns true if bounds on this format constrain a length rather
    /// than a numeric value.
    pub fn bounds_length(&self) -> bool {
        matches!(self, Format::String | Format::Binary | Format::Array)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pattern deciding whether a column is visible under a requested view.
#[derive(Debug, Clone)]
pub enum ViewPattern {
    /// Matches a view with exactly this name
    Exact(String),
    /// Matches any view the expression finds a match in
    Regex(Regex),
}

impl ViewPattern {
    /// Create an exact pattern
    pub fn exact(name: impl Into<String>) -> Self {
        ViewPattern::Exact(name.into())
    }

    /// Create a regex pattern
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(ViewPattern::Regex)
    }

    /// Returns true if this pattern matches the view name
    pub fn matches(&self, view: &str) -> bool {
        match self {
            ViewPattern::Exact(name) => name == view,
            ViewPattern::Regex(re) => re.is_match(view),
        }
    }

    /// Returns the pattern source
    pub fn as_str(&self) -> &str {
        match self {
            ViewPattern::Exact(name) => name,
            ViewPattern::Regex(re) => re.as_str(),
        }
    }
}

impl From<&str> for ViewPattern {
    fn from(name: &str) -> Self {
        ViewPattern::exact(name)
    }
}

impl From<String> for ViewPattern {
    fn from(name: String) -> Self {
        ViewPattern::Exact(name)
    }
}

impl From<Regex> for ViewPattern {
    fn from(re: Regex) -> Self {
        ViewPattern::Regex(re)
    }
}

impl Serialize for ViewPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Direction of a value conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// External input to entity
    Input,
    /// Entity to external output
    Output,
}

/// Per-column conversion function.
///
/// Returning `None` marks the converted value as absent.
#[derive(Clone)]
pub struct Converter(Arc<dyn Fn(Value, Direction) -> Option<Value> + Send + Sync>);

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value, Direction) -> Option<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Apply the conversion
    pub fn apply(&self, value: Value, direction: Direction) -> Option<Value> {
        (self.0)(value, direction)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Converter")
    }
}

/// Returns the JSON kind name of a value for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "int"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serializes an optional regex as its source.
pub(crate) fn serialize_regex<S: Serializer>(
    re: &Option<Regex>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match re {
        Some(re) => serializer.serialize_some(re.as_str()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_type_identity() {
        const PERSON: EntityType = EntityType::named("Person");
        assert_eq!(PERSON, EntityType::named("Person"));
        assert_ne!(PERSON, EntityType::named("Address"));
        assert_eq!(PERSON.to_string(), "Person");
    }

    #[test]
    fn test_format_names() {
        assert_eq!(Format::Id.name(), "ID");
        assert_eq!(Format::Array.to_string(), "ARRAY");
        assert_eq!(serde_json::to_value(Format::Timestamp).unwrap(), json!("TIMESTAMP"));
        assert!(Format::String.bounds_length());
        assert!(!Format::Integer.bounds_length());
    }

    #[test]
    fn test_view_pattern_matching() {
        let exact = ViewPattern::exact("name");
        assert!(exact.matches("name"));
        assert!(!exact.matches("names"));

        let re = ViewPattern::regex("^(summary|detail)$").unwrap();
        assert!(re.matches("summary"));
        assert!(re.matches("detail"));
        assert!(!re.matches("name"));
        assert_eq!(serde_json::to_value(&re).unwrap(), json!("^(summary|detail)$"));
    }

    #[test]
    fn test_converter_direction() {
        let upper = Converter::new(|value, direction| match (direction, value) {
            (Direction::Input, Value::String(s)) => Some(Value::String(s.to_uppercase())),
            (_, value) => Some(value),
        });
        assert_eq!(upper.apply(json!("a"), Direction::Input), Some(json!("A")));
        assert_eq!(upper.apply(json!("a"), Direction::Output), Some(json!("a")));
    }

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(1)), "int");
        assert_eq!(json_type_name(&json!(1.5)), "float");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
