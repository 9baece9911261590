//! rowschema - Schema metadata registry and entity materializer
//!
//! Entity types are declared once through annotations; the registry keeps
//! one storage record per type (real columns, joined virtual columns,
//! views, validators). The materializer then turns untyped JSON input into
//! typed entities against those records.

pub mod config;
pub mod entity;
pub mod observability;
pub mod schema;
