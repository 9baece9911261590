//! Declarative annotations
//!
//! Annotations are plain values: build one once, apply it to any number of
//! properties. Applying an annotation merges its properties into the named
//! column, creating the storage record and column on first use.
//!
//! ```ignore
//! registry.declare(PERSON, "age", [integer().min(0.0), required()])?;
//! registry.declare(PERSON, "address", [join("id", ADDRESS, "address_id")])?;
//! ```

use regex::Regex;
use serde_json::Value;

use super::column::RealColumn;
use super::types::{Converter, Direction, EntityType, Format, ViewPattern};
use super::validator::{FormatOptions, Validator};

/// A reusable declarative annotation
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Storage name of the entity type (type-level)
    Entity(String),
    Alias(String),
    Views(Vec<ViewPattern>),
    Convert(Converter),
    Required,
    Hidden,
    ReadOnly,
    WriteOnly,
    Unique,
    Primary,
    Format(FormatAnnotation),
    Join(JoinAnnotation),
}

/// Format-bearing annotation and its options
#[derive(Debug, Clone)]
pub struct FormatAnnotation {
    pub format: Format,
    pub options: FormatOptions,
    /// Nested entity type for ARRAY/MAP/OBJECT
    pub model: Option<EntityType>,
    /// Nested field list for ARRAY/MAP/OBJECT
    pub fields: Vec<String>,
}

impl FormatAnnotation {
    fn new(format: Format) -> Self {
        Self {
            format,
            options: FormatOptions::default(),
            model: None,
            fields: Vec::new(),
        }
    }

    /// Merges this format into a real column and appends its validator
    pub(crate) fn merge_into(&self, column: &mut RealColumn) {
        if self.options.min.is_some() {
            column.minimum = self.options.min;
        }
        if self.options.max.is_some() {
            column.maximum = self.options.max;
        }
        if self.options.pattern.is_some() {
            column.pattern = self.options.pattern.clone();
        }
        if !self.options.values.is_empty() {
            column.values = self.options.values.clone();
        }
        if self.model.is_some() {
            column.model = self.model;
        }
        if !self.fields.is_empty() {
            column.fields = self.fields.clone();
        }
        column
            .core
            .push_format(Validator::for_format(self.format, self.options.clone()));
    }
}

/// Join annotation resolved against both entity types when applied
#[derive(Debug, Clone)]
pub struct JoinAnnotation {
    /// Column on the joined type
    pub foreign_key: String,
    /// Joined entity type
    pub model: EntityType,
    /// Column on the declaring type
    pub local_key: String,
    /// Join-all semantics
    pub all: bool,
    pub filter: Option<Value>,
}

impl Annotation {
    /// Lower bound for numeric formats, minimum length otherwise
    pub fn min(mut self, min: f64) -> Self {
        if let Annotation::Format(format) = &mut self {
            format.options.min = Some(min);
        }
        self
    }

    /// Upper bound for numeric formats, maximum length otherwise
    pub fn max(mut self, max: f64) -> Self {
        if let Annotation::Format(format) = &mut self {
            format.options.max = Some(max);
        }
        self
    }

    /// Nested field list for ARRAY/MAP/OBJECT formats
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Annotation::Format(format) = &mut self {
            format.fields = fields.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Pre-filter for `join`, query filter for `join_all`
    pub fn filter(mut self, filter: Value) -> Self {
        if let Annotation::Join(join) = &mut self {
            join.filter = Some(filter);
        }
        self
    }

    /// Returns true for annotations describing the type rather than a property
    pub fn is_type_level(&self) -> bool {
        matches!(self, Annotation::Entity(_))
    }

    /// Returns true for annotations that apply to either column kind
    pub fn is_shared(&self) -> bool {
        matches!(
            self,
            Annotation::Alias(_) | Annotation::Views(_) | Annotation::Hidden
        )
    }

    /// Short name used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Annotation::Entity(_) => "entity",
            Annotation::Alias(_) => "alias",
            Annotation::Views(_) => "views",
            Annotation::Convert(_) => "convert",
            Annotation::Required => "required",
            Annotation::Hidden => "hidden",
            Annotation::ReadOnly => "read_only",
            Annotation::WriteOnly => "write_only",
            Annotation::Unique => "unique",
            Annotation::Primary => "primary",
            Annotation::Format(format) => format.format.name(),
            Annotation::Join(join) if join.all => "join_all",
            Annotation::Join(_) => "join",
        }
    }
}

pub fn entity(name: impl Into<String>) -> Annotation {
    Annotation::Entity(name.into())
}

pub fn alias(name: impl Into<String>) -> Annotation {
    Annotation::Alias(name.into())
}

/// Replaces the column's view patterns
pub fn views<I, P>(patterns: I) -> Annotation
where
    I: IntoIterator<Item = P>,
    P: Into<ViewPattern>,
{
    Annotation::Views(patterns.into_iter().map(Into::into).collect())
}

pub fn convert<F>(f: F) -> Annotation
where
    F: Fn(Value, Direction) -> Option<Value> + Send + Sync + 'static,
{
    Annotation::Convert(Converter::new(f))
}

pub fn required() -> Annotation {
    Annotation::Required
}

pub fn hidden() -> Annotation {
    Annotation::Hidden
}

pub fn read_only() -> Annotation {
    Annotation::ReadOnly
}

pub fn write_only() -> Annotation {
    Annotation::WriteOnly
}

pub fn unique() -> Annotation {
    Annotation::Unique
}

pub fn primary() -> Annotation {
    Annotation::Primary
}

fn format(format: Format) -> Annotation {
    Annotation::Format(FormatAnnotation::new(format))
}

pub fn id() -> Annotation {
    format(Format::Id)
}

pub fn null() -> Annotation {
    format(Format::Null)
}

pub fn binary() -> Annotation {
    format(Format::Binary)
}

pub fn boolean() -> Annotation {
    format(Format::Boolean)
}

pub fn integer() -> Annotation {
    format(Format::Integer)
}

pub fn decimal() -> Annotation {
    format(Format::Decimal)
}

pub fn number() -> Annotation {
    format(Format::Number)
}

pub fn string() -> Annotation {
    format(Format::String)
}

pub fn enumeration<I, V>(values: I) -> Annotation
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let mut annotation = FormatAnnotation::new(Format::Enumeration);
    annotation.options.values = values.into_iter().map(Into::into).collect();
    Annotation::Format(annotation)
}

pub fn pattern(re: Regex) -> Annotation {
    let mut annotation = FormatAnnotation::new(Format::Pattern);
    annotation.options.pattern = Some(re);
    Annotation::Format(annotation)
}

pub fn timestamp() -> Annotation {
    format(Format::Timestamp)
}

pub fn date() -> Annotation {
    format(Format::Date)
}

/// Array of scalar values
pub fn array() -> Annotation {
    format(Format::Array)
}

/// Array of nested entities
pub fn array_of(model: EntityType) -> Annotation {
    nested(Format::Array, model)
}

/// Name-keyed map of nested entities
pub fn map(model: EntityType) -> Annotation {
    nested(Format::Map, model)
}

/// Single nested entity
pub fn object(model: EntityType) -> Annotation {
    nested(Format::Object, model)
}

fn nested(format: Format, model: EntityType) -> Annotation {
    let mut annotation = FormatAnnotation::new(format);
    annotation.model = Some(model);
    Annotation::Format(annotation)
}

/// Joins one foreign row matched on `foreign_key == local_key`
pub fn join(
    foreign_key: impl Into<String>,
    model: EntityType,
    local_key: impl Into<String>,
) -> Annotation {
    Annotation::Join(JoinAnnotation {
        foreign_key: foreign_key.into(),
        model,
        local_key: local_key.into(),
        all: false,
        filter: None,
    })
}

/// Joins every foreign row matched on `foreign_key == local_key`
pub fn join_all(
    foreign_key: impl Into<String>,
    model: EntityType,
    local_key: impl Into<String>,
) -> Annotation {
    Annotation::Join(JoinAnnotation {
        foreign_key: foreign_key.into(),
        model,
        local_key: local_key.into(),
        all: true,
        filter: None,
    })
}
