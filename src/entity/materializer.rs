//! Entity materializer
//!
//! Walks untyped JSON input against the filtered rows of a registry and
//! builds typed entities, recursing into nested and joined types.
//!
//! Two modes:
//! - partial (`create*`): missing required fields are tolerated
//! - strict (`create_full*`): every required, writable column must be set
//!
//! A failure anywhere discards the whole entity.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::value::{Entity, FieldValue, Model};
use crate::schema::{
    json_type_name, Column, EntityType, Format, RealColumn, SchemaError, SchemaRegistry,
    SchemaResult, VirtualColumn,
};
use crate::observability::Event;

/// Column name reported when the input itself has the wrong shape
const ROOT: &str = "$root";

/// Builds entities from untyped input
#[derive(Debug, Clone, Copy)]
pub struct Materializer<'a> {
    registry: &'a SchemaRegistry,
}

/// Shape of a column that holds entities of another type
struct NestedShape<'c> {
    column: &'c str,
    model: EntityType,
    array: bool,
    object: bool,
    map: bool,
    all: bool,
}

impl<'c> NestedShape<'c> {
    fn from_real(column: &'c RealColumn, model: EntityType) -> Self {
        Self {
            column: column.name(),
            model,
            array: column.has_format(Format::Array),
            object: column.has_format(Format::Object),
            map: column.has_format(Format::Map),
            all: false,
        }
    }

    fn from_virtual(column: &'c VirtualColumn) -> Self {
        Self {
            column: column.name(),
            model: column.model,
            array: column.has_format(Format::Array),
            object: column.has_format(Format::Object),
            map: false,
            all: column.all,
        }
    }

    fn expected(&self) -> String {
        let mut shapes = Vec::new();
        if self.array {
            shapes.push(Format::Array.name());
        }
        if self.object {
            shapes.push(Format::Object.name());
        }
        if self.map {
            shapes.push(Format::Map.name());
        }
        if shapes.is_empty() {
            return "NONE".to_string();
        }
        shapes.join(" | ")
    }
}

impl<'a> Materializer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Partial materialization of every column
    pub fn create(&self, model: EntityType, input: &Value) -> SchemaResult<Entity> {
        self.materialize(model, input, &[], false)
    }

    /// Strict materialization of every column
    pub fn create_full(&self, model: EntityType, input: &Value) -> SchemaResult<Entity> {
        self.materialize(model, input, &[], true)
    }

    /// Partial materialization narrowed to `fields`.
    ///
    /// A field is a column name or view, or a dotted path into a nested
    /// column (`address.city`).
    pub fn create_with_fields(
        &self,
        model: EntityType,
        input: &Value,
        fields: &[&str],
    ) -> SchemaResult<Entity> {
        self.materialize(model, input, fields, false)
    }

    /// Strict materialization narrowed to `fields`
    pub fn create_full_with_fields(
        &self,
        model: EntityType,
        input: &Value,
        fields: &[&str],
    ) -> SchemaResult<Entity> {
        self.materialize(model, input, fields, true)
    }

    pub fn create_array(&self, model: EntityType, inputs: &[Value]) -> SchemaResult<Vec<Entity>> {
        inputs
            .iter()
            .map(|input| self.create(model, input))
            .collect()
    }

    pub fn create_full_array(&self, model: EntityType, inputs: &[Value]) -> SchemaResult<Vec<Entity>> {
        inputs
            .iter()
            .map(|input| self.create_full(model, input))
            .collect()
    }

    pub fn create_map(
        &self,
        model: EntityType,
        inputs: &Map<String, Value>,
    ) -> SchemaResult<BTreeMap<String, Entity>> {
        inputs
            .iter()
            .map(|(key, input)| Ok((key.clone(), self.create(model, input)?)))
            .collect()
    }

    pub fn create_full_map(
        &self,
        model: EntityType,
        inputs: &Map<String, Value>,
    ) -> SchemaResult<BTreeMap<String, Entity>> {
        inputs
            .iter()
            .map(|(key, input)| Ok((key.clone(), self.create_full(model, input)?)))
            .collect()
    }

    /// Partial materialization decoded into `T`
    pub fn create_model<T: Model>(&self, input: &Value) -> SchemaResult<T> {
        self.create(T::entity_type(), input)?.into_model()
    }

    /// Strict materialization decoded into `T`
    pub fn create_full_model<T: Model>(&self, input: &Value) -> SchemaResult<T> {
        self.create_full(T::entity_type(), input)?.into_model()
    }

    fn materialize(
        &self,
        model: EntityType,
        input: &Value,
        fields: &[&str],
        required: bool,
    ) -> SchemaResult<Entity> {
        let metrics = self.registry.metrics();
        match self.create_entity(model, input, fields, required) {
            Ok(entity) => {
                metrics.increment_entities_materialized();
                self.registry
                    .observe(Event::MaterializeComplete, &[("entity", model.name())]);
                Ok(entity)
            }
            Err(err) => {
                metrics.increment_materializations_rejected();
                self.registry.observe(
                    Event::MaterializeRejected,
                    &[
                        ("entity", model.name()),
                        ("column", err.column().unwrap_or("")),
                        ("code", err.code().code()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn create_entity(
        &self,
        model: EntityType,
        input: &Value,
        fields: &[&str],
        required: bool,
    ) -> SchemaResult<Entity> {
        let views = self.views(fields);
        let real = self.registry.get_real_row(model, &views)?;
        let joined = self.registry.get_virtual_row(model, &views)?;
        let storage = self.registry.storage_label(model);

        let entry = input.as_object().ok_or_else(|| {
            SchemaError::unsupported_shape(&storage, ROOT, "OBJECT", json_type_name(input))
        })?;

        let mut entity = Entity::new(model);
        for column in &real {
            match entry.get(column.name()) {
                None => {
                    if required && column.required && !column.read_only {
                        return Err(SchemaError::missing_required_field(&storage, column.name()));
                    }
                }
                Some(_) if column.read_only => {
                    return Err(SchemaError::read_only_violation(&storage, column.name()));
                }
                Some(raw) => {
                    if let Some(value) = self.resolve_real(&storage, column, raw, fields, required)? {
                        entity.set(column.name(), value);
                    }
                }
            }
        }

        for column in &joined {
            if let Some(raw) = entry.get(column.name()) {
                let shape = NestedShape::from_virtual(column);
                let nested_fields = self.nested_fields(column.name(), fields);
                let nested_required = required && nested_fields.is_empty();
                let value = self.resolve_nested(&storage, &shape, raw, &nested_fields, nested_required)?;
                entity.set(column.name(), value);
            }
        }

        Ok(entity)
    }

    fn resolve_real(
        &self,
        storage: &str,
        column: &RealColumn,
        raw: &Value,
        fields: &[&str],
        required: bool,
    ) -> SchemaResult<Option<FieldValue>> {
        match column.model {
            Some(model) => {
                let shape = NestedShape::from_real(column, model);
                let nested_fields = self.nested_fields(column.name(), fields);
                let nested_required = required && nested_fields.is_empty();
                self.resolve_nested(storage, &shape, raw, &nested_fields, nested_required)
                    .map(Some)
            }
            None => Ok(column.convert_input(raw.clone()).map(FieldValue::Scalar)),
        }
    }

    fn resolve_nested(
        &self,
        storage: &str,
        shape: &NestedShape<'_>,
        raw: &Value,
        fields: &[&str],
        required: bool,
    ) -> SchemaResult<FieldValue> {
        match raw {
            Value::Array(items) => {
                if !shape.array {
                    return Err(SchemaError::unsupported_shape(
                        storage,
                        shape.column,
                        &shape.expected(),
                        "array",
                    ));
                }
                items
                    .iter()
                    .map(|item| self.resolve_element(storage, shape, item, fields, required, shape.all))
                    .collect::<SchemaResult<Vec<_>>>()
                    .map(FieldValue::Array)
            }
            Value::Object(entries) => {
                if shape.object {
                    let entity = self.nested_entity(storage, shape, raw, fields, required)?;
                    Ok(FieldValue::Object(Box::new(entity)))
                } else if shape.map {
                    entries
                        .iter()
                        .map(|(key, item)| {
                            let entity = self.nested_entity(storage, shape, item, fields, required)?;
                            Ok((key.clone(), entity))
                        })
                        .collect::<SchemaResult<BTreeMap<_, _>>>()
                        .map(FieldValue::Map)
                } else {
                    Err(SchemaError::unsupported_shape(
                        storage,
                        shape.column,
                        &shape.expected(),
                        "object",
                    ))
                }
            }
            Value::Null => Ok(FieldValue::Scalar(Value::Null)),
            other => Err(SchemaError::unsupported_shape(
                storage,
                shape.column,
                &shape.expected(),
                json_type_name(other),
            )),
        }
    }

    /// One element of a nested sequence; `descend` allows one level of
    /// sub-sequences.
    fn resolve_element(
        &self,
        storage: &str,
        shape: &NestedShape<'_>,
        item: &Value,
        fields: &[&str],
        required: bool,
        descend: bool,
    ) -> SchemaResult<FieldValue> {
        match item {
            Value::Array(inner) if descend => inner
                .iter()
                .map(|nested| self.resolve_element(storage, shape, nested, fields, required, false))
                .collect::<SchemaResult<Vec<_>>>()
                .map(FieldValue::Array),
            _ => {
                let entity = self.nested_entity(storage, shape, item, fields, required)?;
                Ok(FieldValue::Object(Box::new(entity)))
            }
        }
    }

    fn nested_entity(
        &self,
        storage: &str,
        shape: &NestedShape<'_>,
        item: &Value,
        fields: &[&str],
        required: bool,
    ) -> SchemaResult<Entity> {
        if !item.is_object() {
            return Err(SchemaError::unsupported_shape(
                storage,
                shape.column,
                Format::Object.name(),
                json_type_name(item),
            ));
        }
        self.create_entity(shape.model, item, fields, required)
    }

    /// Views for a field list: top-level path segments, or the wildcard
    fn views<'f>(&'f self, fields: &[&'f str]) -> Vec<&'f str> {
        let config = self.registry.config();
        if fields.is_empty() {
            return vec![config.wildcard_view.as_str()];
        }
        let mut views: Vec<&str> = Vec::with_capacity(fields.len());
        for &field in fields {
            let (head, _) = config.split_path(field);
            if !views.contains(&head) {
                views.push(head);
            }
        }
        views
    }

    /// Remainders of the `column.<rest>` entries of `fields`
    fn nested_fields<'f>(&self, column: &str, fields: &[&'f str]) -> Vec<&'f str> {
        let separator = self.registry.config().path_separator;
        fields
            .iter()
            .filter_map(|&field| field.strip_prefix(column)?.strip_prefix(separator))
            .collect()
    }
}
