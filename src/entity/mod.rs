//! Entity materialization
//!
//! Builds typed entities from untyped JSON input using the filtered rows
//! of a [`SchemaRegistry`](crate::schema::SchemaRegistry).

mod materializer;
mod value;

pub use materializer::Materializer;
pub use value::{Entity, FieldValue, Model};
