//! Format validators and their composition
//!
//! Every format annotation contributes one atomic validator to its column.
//! A column's validators are combined into a single OR-group: a value is
//! valid when at least one declared format accepts it.
//!
//! Validators never mutate or coerce values.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{json_type_name, Format};

/// Options captured by a format annotation when its validator is built.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Lower bound (value for numeric formats, length otherwise)
    pub min: Option<f64>,
    /// Upper bound (value for numeric formats, length otherwise)
    pub max: Option<f64>,
    /// Allowed values for ENUMERATION
    pub values: Vec<Value>,
    /// Expression for PATTERN
    pub pattern: Option<Regex>,
}

impl FormatOptions {
    fn within(&self, n: f64) -> bool {
        self.min.map_or(true, |min| n >= min) && self.max.map_or(true, |max| n <= max)
    }
}

/// Atomic check for one declared format.
#[derive(Clone)]
pub struct Validator {
    format: Format,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Validator {
    /// Create a validator from an arbitrary predicate
    pub fn new<F>(format: Format, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            format,
            check: Arc::new(check),
        }
    }

    /// Build the built-in validator for a format
    pub fn for_format(format: Format, options: FormatOptions) -> Self {
        Self::new(format, move |value| check_format(format, &options, value))
    }

    /// Returns the format this validator checks
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns true if the value satisfies this format
    pub fn check(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({})", self.format)
    }
}

/// OR-combination of a column's validators.
#[derive(Debug, Clone, Default)]
pub struct ComposedValidator {
    validators: Vec<Validator>,
}

/// Combine validators into one OR-group.
pub fn compose(validators: &[Validator]) -> ComposedValidator {
    ComposedValidator {
        validators: validators.to_vec(),
    }
}

impl ComposedValidator {
    /// Returns true if any validator accepts the value.
    ///
    /// An empty group accepts every value.
    pub fn check(&self, value: &Value) -> bool {
        self.validators.is_empty() || self.validators.iter().any(|v| v.check(value))
    }

    /// Returns the formats in the group, in declaration order
    pub fn formats(&self) -> Vec<Format> {
        self.validators.iter().map(Validator::format).collect()
    }

    /// Human-readable description of the accepted formats
    pub fn expected(&self) -> String {
        if self.validators.is_empty() {
            return "any value".into();
        }
        self.validators
            .iter()
            .map(|v| v.format().name())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Validates a value, reporting the field path on failure.
    pub fn validate(&self, storage: &str, field: &str, value: &Value) -> SchemaResult<()> {
        if self.check(value) {
            return Ok(());
        }
        Err(SchemaError::validation_failed(
            storage,
            ValidationDetails::new(field, self.expected(), json_type_name(value)),
        ))
    }
}

fn check_format(format: Format, options: &FormatOptions, value: &Value) -> bool {
    match format {
        Format::Id => match value {
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => n.is_u64(),
            _ => false,
        },
        Format::Null => value.is_null(),
        Format::Binary => value
            .as_str()
            .and_then(|s| STANDARD.decode(s).ok())
            .map_or(false, |bytes| options.within(bytes.len() as f64)),
        Format::Boolean => value.is_boolean(),
        Format::Integer => {
            (value.is_i64() || value.is_u64())
                && value.as_f64().map_or(false, |n| options.within(n))
        }
        Format::Decimal => match value {
            Value::Number(n) => n.as_f64().map_or(false, |n| options.within(n)),
            Value::String(s) => {
                is_decimal_literal(s) && s.parse::<f64>().map_or(false, |n| options.within(n))
            }
            _ => false,
        },
        Format::Number => value.as_f64().map_or(false, |n| options.within(n)),
        Format::String => value
            .as_str()
            .map_or(false, |s| options.within(s.chars().count() as f64)),
        Format::Enumeration => options.values.contains(value),
        Format::Pattern => match (&options.pattern, value.as_str()) {
            (Some(re), Some(s)) => re.is_match(s),
            _ => false,
        },
        Format::Timestamp => match value {
            Value::Number(n) => n.is_u64(),
            Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
            _ => false,
        },
        Format::Date => value
            .as_str()
            .map_or(false, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
        Format::Array => value
            .as_array()
            .map_or(false, |items| options.within(items.len() as f64)),
        Format::Map | Format::Object => value.is_object(),
    }
}

/// Accepts an optional sign, digits, and at most one fractional part.
fn is_decimal_literal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let mut parts = unsigned.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    match parts.next() {
        Some(fraction) => digits(whole) && digits(fraction),
        None => digits(whole),
    }
}
