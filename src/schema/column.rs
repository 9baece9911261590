//! Column schemas
//!
//! A real column is backed by a stored field of its own entity; a virtual
//! column is computed through a join to another entity type. Both share a
//! `ColumnCore` holding naming, formats, validators and views.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::errors::SchemaResult;
use super::types::{serialize_regex, Converter, Direction, EntityType, Format, ViewPattern};
use super::validator::{compose, ComposedValidator, Validator};

/// Metadata shared by real and virtual columns.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnCore {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Declared formats, index-aligned with `validators`
    pub formats: Vec<Format>,
    #[serde(skip)]
    pub validators: Vec<Validator>,
    /// Declared view patterns; empty means the default view only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewPattern>,
    pub hidden: bool,
}

impl ColumnCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            formats: Vec::new(),
            validators: Vec::new(),
            views: Vec::new(),
            hidden: false,
        }
    }

    /// Appends one (format, validator) pair
    pub fn push_format(&mut self, validator: Validator) {
        self.formats.push(validator.format());
        self.validators.push(validator);
    }

    /// Returns true if the column is visible under any of the views.
    ///
    /// Without declared views the column answers only to its own name.
    pub fn is_view(&self, views: &[&str], wildcard: &str) -> bool {
        if views.iter().any(|v| *v == wildcard) {
            return true;
        }
        if self.views.is_empty() {
            return views.iter().any(|v| *v == self.name);
        }
        self.views
            .iter()
            .any(|pattern| views.iter().any(|v| pattern.matches(v)))
    }
}

/// Common read access over real and virtual columns.
pub trait Column: Clone {
    fn core(&self) -> &ColumnCore;

    fn name(&self) -> &str {
        &self.core().name
    }

    fn alias(&self) -> Option<&str> {
        self.core().alias.as_deref()
    }

    fn formats(&self) -> &[Format] {
        &self.core().formats
    }

    fn has_format(&self, format: Format) -> bool {
        self.core().formats.contains(&format)
    }

    fn is_hidden(&self) -> bool {
        self.core().hidden
    }

    /// OR-group of this column's validators
    fn validator(&self) -> ComposedValidator {
        compose(&self.core().validators)
    }

    /// Validates a value against the column's declared formats
    fn validate(&self, storage: &str, value: &Value) -> SchemaResult<()> {
        self.validator().validate(storage, self.name(), value)
    }
}

/// Column backed by a stored field
#[derive(Debug, Clone, Serialize)]
pub struct RealColumn {
    #[serde(flatten)]
    pub core: ColumnCore,
    #[serde(skip)]
    pub converter: Option<Converter>,
    pub unique: bool,
    pub required: bool,
    pub read_only: bool,
    pub write_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(serialize_with = "serialize_regex", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Regex>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
    /// Nested entity type for ARRAY/MAP/OBJECT columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<EntityType>,
    /// Nested field list for ARRAY/MAP/OBJECT columns
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl RealColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: ColumnCore::new(name),
            converter: None,
            unique: false,
            required: false,
            read_only: false,
            write_only: false,
            minimum: None,
            maximum: None,
            pattern: None,
            values: Vec::new(),
            model: None,
            fields: Vec::new(),
        }
    }

    /// Applies the input-direction converter, identity if none declared
    pub fn convert_input(&self, value: Value) -> Option<Value> {
        match &self.converter {
            Some(converter) => converter.apply(value, Direction::Input),
            None => Some(value),
        }
    }
}

impl Column for RealColumn {
    fn core(&self) -> &ColumnCore {
        &self.core
    }
}

/// Column computed through a join to another entity type
#[derive(Debug, Clone, Serialize)]
pub struct VirtualColumn {
    #[serde(flatten)]
    pub core: ColumnCore,
    /// Local key column on the declaring type
    pub local: String,
    /// Foreign key column on the joined type
    pub foreign: String,
    /// True when the local key column is array-typed
    pub multiple: bool,
    /// Joined entity type
    pub model: EntityType,
    /// Opaque pre-filter or query filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// True for join-all semantics
    pub all: bool,
}

impl VirtualColumn {
    pub fn new(
        name: impl Into<String>,
        local: impl Into<String>,
        foreign: impl Into<String>,
        model: EntityType,
    ) -> Self {
        Self {
            core: ColumnCore::new(name),
            local: local.into(),
            foreign: foreign.into(),
            multiple: false,
            model,
            filter: None,
            all: false,
        }
    }

    /// True when the joined value is a sequence of entities
    pub fn is_sequence(&self) -> bool {
        self.multiple || self.all
    }
}

impl Column for VirtualColumn {
    fn core(&self) -> &ColumnCore {
        &self.core
    }
}

/// Ordered, immutable snapshot of columns.
///
/// Rows are copies: nothing done to a row reaches the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Row<C> {
    columns: Vec<C>,
}

impl<C: Column> Row<C> {
    pub(crate) fn new(columns: Vec<C>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&C> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<'a, C: Column> IntoIterator for &'a Row<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validator::FormatOptions;
    use serde_json::json;

    #[test]
    fn test_default_view_is_own_name() {
        let core = ColumnCore::new("name");
        assert!(core.is_view(&["name"], "*"));
        assert!(core.is_view(&["other", "*"], "*"));
        assert!(!core.is_view(&["other"], "*"));
        assert!(!core.is_view(&[], "*"));
    }

    #[test]
    fn test_declared_views_replace_default() {
        let mut core = ColumnCore::new("email");
        core.views = vec![ViewPattern::exact("private")];
        assert!(core.is_view(&["private"], "*"));
        assert!(!core.is_view(&["email"], "*"));
    }

    #[test]
    fn test_formats_align_with_validators() {
        let mut column = RealColumn::new("nickname");
        column
            .core
            .push_format(Validator::for_format(Format::String, FormatOptions::default()));
        column
            .core
            .push_format(Validator::for_format(Format::Null, FormatOptions::default()));

        assert_eq!(column.formats(), &[Format::String, Format::Null]);
        assert_eq!(column.core.validators.len(), 2);
        assert!(column.validate("people", &json!(null)).is_ok());
        assert!(column.validate("people", &json!(5)).is_err());
    }

    #[test]
    fn test_convert_input_identity() {
        let column = RealColumn::new("name");
        assert_eq!(column.convert_input(json!("A")), Some(json!("A")));
    }

    #[test]
    fn test_serialize_skips_functions() {
        let mut column = RealColumn::new("code");
        column.pattern = Some(Regex::new("^[a-z]+$").unwrap());
        column.converter = Some(Converter::new(|v, _| Some(v)));

        let value = serde_json::to_value(&column).unwrap();
        assert_eq!(value["name"], "code");
        assert_eq!(value["pattern"], "^[a-z]+$");
        assert!(value.get("converter").is_none());
        assert!(value.get("validators").is_none());
    }

    #[test]
    fn test_row_lookup_and_order() {
        let row = Row::new(vec![RealColumn::new("b"), RealColumn::new("a")]);
        assert_eq!(row.names(), vec!["b", "a"]);
        assert!(row.contains("a"));
        assert!(row.get("c").is_none());
        assert_eq!(row.len(), 2);
    }
}
