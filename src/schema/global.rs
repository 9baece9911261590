//! Process-wide schema registry
//!
//! Declarations run once at startup, before any read path; the registry
//! then lives for the rest of the process. Lock poisoning is recovered:
//! every declaration leaves the registry consistent even if it fails.

use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::annotation::Annotation;
use super::errors::SchemaResult;
use super::registry::SchemaRegistry;
use super::types::EntityType;

static REGISTRY: LazyLock<RwLock<SchemaRegistry>> =
    LazyLock::new(|| RwLock::new(SchemaRegistry::new()));

/// Read access to the process-wide registry
pub fn read() -> RwLockReadGuard<'static, SchemaRegistry> {
    REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access to the process-wide registry
pub fn write() -> RwLockWriteGuard<'static, SchemaRegistry> {
    REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

/// Applies annotations to a property of the process-wide registry
pub fn declare<I>(model: EntityType, property: &str, annotations: I) -> SchemaResult<()>
where
    I: IntoIterator<Item = Annotation>,
{
    write().declare(model, property, annotations)
}

/// Applies a type-level annotation to the process-wide registry
pub fn annotate_type(model: EntityType, annotation: &Annotation) -> SchemaResult<()> {
    write().annotate_type(model, annotation)
}

/// Seals the process-wide registry
pub fn seal() {
    write().seal();
}

pub fn is_entity(model: EntityType) -> bool {
    read().is_entity(model)
}
