//! Schema registry subsystem
//!
//! Entity types are described once, at startup, through annotations merged
//! into per-type storage records. Readers get copies of filtered rows.
//!
//! # Design Principles
//!
//! - Records and columns are created lazily by the first annotation
//! - A property is either real or virtual, never both
//! - Read-only and write-only exclude each other
//! - Every format annotation adds exactly one (format, validator) pair
//! - Reads never expose registry-internal state

mod annotation;
mod column;
mod errors;
pub mod global;
mod record;
mod registry;
mod types;
mod validator;

pub use annotation::{
    alias, array, array_of, binary, boolean, convert, date, decimal, entity, enumeration, hidden,
    id, integer, join, join_all, map, null, number, object, pattern, primary, read_only,
    required, string, timestamp, unique, views, write_only, Annotation, FormatAnnotation,
    JoinAnnotation,
};
pub use column::{Column, ColumnCore, RealColumn, Row, VirtualColumn};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use record::StorageRecord;
pub use registry::{Declaration, SchemaRegistry};
pub use types::{json_type_name, Converter, Direction, EntityType, Format, ViewPattern};
pub use validator::{compose, ComposedValidator, FormatOptions, Validator};
