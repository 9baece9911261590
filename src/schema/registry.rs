//! Schema registry
//!
//! Maps entity types to storage records. Declarations merge into records
//! incrementally; reads hand out copies, so callers never observe or
//! change registry-internal state.
//!
//! Lifecycle:
//! - declare every type (annotations, joins)
//! - optionally `seal()`: further declarations are rejected
//! - read rows and materialize entities

use std::collections::HashMap;

use serde_json::Value;

use super::annotation::{entity, Annotation, JoinAnnotation};
use super::column::{Column, RealColumn, Row, VirtualColumn};
use super::errors::{SchemaError, SchemaResult};
use super::record::StorageRecord;
use super::types::{EntityType, Format};
use super::validator::{FormatOptions, Validator};
use crate::config::RegistryConfig;
use crate::entity::Materializer;
use crate::observability::{log_event, Event, MetricsRegistry};

/// Registry of entity storage records
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Records indexed by entity type
    records: HashMap<EntityType, StorageRecord>,
    /// Set once declarations are closed
    sealed: bool,
    config: RegistryConfig,
    metrics: MetricsRegistry,
}

impl SchemaRegistry {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Returns a materializer reading this registry.
    pub fn materializer(&self) -> Materializer<'_> {
        Materializer::new(self)
    }

    // ---------------------------------------------------------------------
    // Declaration
    // ---------------------------------------------------------------------

    /// Starts a fluent declaration for `model`.
    pub fn define(&mut self, model: EntityType) -> Declaration<'_> {
        Declaration {
            registry: self,
            model,
            error: None,
        }
    }

    /// Applies a type-level annotation (`entity(name)`).
    pub fn annotate_type(&mut self, model: EntityType, annotation: &Annotation) -> SchemaResult<()> {
        let result = self.check_open(model).and_then(|_| match annotation {
            Annotation::Entity(name) => {
                self.record_mut(model).name = name.clone();
                Ok(())
            }
            other => Err(SchemaError::invalid_annotation(
                self.storage_label(model),
                format!("{}() describes a property, not a type", other.label()),
            )),
        });

        if let Err(err) = &result {
            self.reject(model, None, annotation, err);
        }
        result
    }

    /// Applies a property annotation to `property` of `model`.
    ///
    /// Creates the storage record and the column on first use.
    pub fn annotate(
        &mut self,
        model: EntityType,
        property: &str,
        annotation: &Annotation,
    ) -> SchemaResult<()> {
        let before = self.records.get(&model).map_or(0, StorageRecord::column_count);
        let result = self
            .check_open(model)
            .and_then(|_| self.apply(model, property, annotation));

        match &result {
            Ok(()) => {
                let after = self.records.get(&model).map_or(0, StorageRecord::column_count);
                if after > before {
                    self.metrics.add_columns_declared((after - before) as u64);
                    self.observe(
                        Event::ColumnDeclared,
                        &[("entity", model.name()), ("column", property)],
                    );
                }
            }
            Err(err) => self.reject(model, Some(property), annotation, err),
        }
        result
    }

    /// Applies annotations to `property` in order, stopping at the first failure.
    pub fn declare<I>(&mut self, model: EntityType, property: &str, annotations: I) -> SchemaResult<()>
    where
        I: IntoIterator<Item = Annotation>,
    {
        for annotation in annotations {
            self.annotate(model, property, &annotation)?;
        }
        Ok(())
    }

    /// Closes the registry to further declarations.
    pub fn seal(&mut self) {
        if self.sealed {
            return;
        }
        self.sealed = true;
        let count = self.records.len().to_string();
        self.observe(Event::RegistrySealed, &[("entities", count.as_str())]);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    fn check_open(&self, model: EntityType) -> SchemaResult<()> {
        if self.sealed {
            return Err(SchemaError::registry_sealed(self.storage_label(model)));
        }
        Ok(())
    }

    fn apply(&mut self, model: EntityType, property: &str, annotation: &Annotation) -> SchemaResult<()> {
        match annotation {
            Annotation::Entity(_) => Err(SchemaError::invalid_annotation(
                self.storage_label(model),
                format!("entity() describes a type, not property '{}'", property),
            )),
            Annotation::Join(join) => self.apply_join(model, property, join),
            other => apply_property(self.record_mut(model), property, other),
        }
    }

    fn apply_join(&mut self, model: EntityType, property: &str, join: &JoinAnnotation) -> SchemaResult<()> {
        let foreign_known = self
            .records
            .get(&join.model)
            .map_or(false, |record| record.is_real(&join.foreign_key));
        if !foreign_known {
            return Err(SchemaError::unknown_column(
                self.storage_label(join.model),
                &join.foreign_key,
            ));
        }

        let multiple = match self
            .records
            .get(&model)
            .and_then(|record| record.real_column(&join.local_key))
        {
            Some(local) => local.has_format(Format::Array),
            None => {
                return Err(SchemaError::unknown_column(
                    self.storage_label(model),
                    &join.local_key,
                ))
            }
        };

        let column = self.record_mut(model).virtual_column_mut(property, || {
            VirtualColumn::new(property, &join.local_key, &join.foreign_key, join.model)
        })?;
        column.local = join.local_key.clone();
        column.foreign = join.foreign_key.clone();
        column.model = join.model;
        column.multiple = multiple;
        column.all = join.all;
        if join.filter.is_some() {
            column.filter = join.filter.clone();
        }
        let format = if column.is_sequence() {
            Format::Array
        } else {
            Format::Object
        };
        column
            .core
            .push_format(Validator::for_format(format, FormatOptions::default()));

        self.metrics.increment_joins_resolved();
        self.observe(
            Event::JoinResolved,
            &[
                ("entity", model.name()),
                ("column", property),
                ("foreign", join.model.name()),
            ],
        );
        Ok(())
    }

    fn record_mut(&mut self, model: EntityType) -> &mut StorageRecord {
        if !self.records.contains_key(&model) {
            self.metrics.increment_entities_registered();
            self.observe(Event::EntityRegistered, &[("entity", model.name())]);
        }
        self.records
            .entry(model)
            .or_insert_with(|| StorageRecord::new(model.name()))
    }

    fn reject(
        &self,
        model: EntityType,
        property: Option<&str>,
        annotation: &Annotation,
        err: &SchemaError,
    ) {
        self.metrics.increment_declarations_rejected();
        self.observe(
            Event::DeclarationRejected,
            &[
                ("entity", model.name()),
                ("column", property.unwrap_or("")),
                ("annotation", annotation.label()),
                ("code", err.code().code()),
            ],
        );
    }

    pub(crate) fn observe(&self, event: Event, fields: &[(&str, &str)]) {
        log_event(event, self.config.log_level, fields);
    }

    /// Storage name if registered, type name otherwise
    pub(crate) fn storage_label(&self, model: EntityType) -> String {
        self.records
            .get(&model)
            .map_or_else(|| model.name().to_string(), |record| record.name.clone())
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Returns true if a storage record exists for `model`
    pub fn is_entity(&self, model: EntityType) -> bool {
        self.records.contains_key(&model)
    }

    /// Registered entity types, sorted by name
    pub fn entity_types(&self) -> Vec<EntityType> {
        let mut types: Vec<EntityType> = self.records.keys().copied().collect();
        types.sort();
        types
    }

    fn record(&self, model: EntityType) -> SchemaResult<&StorageRecord> {
        self.records
            .get(&model)
            .ok_or_else(|| SchemaError::invalid_model(model.name()))
    }

    /// Copy of the whole storage record
    pub fn get_record(&self, model: EntityType) -> SchemaResult<StorageRecord> {
        self.record(model).cloned()
    }

    /// Real columns visible under any of `views`.
    ///
    /// The wildcard view selects every column.
    pub fn get_real_row(&self, model: EntityType, views: &[&str]) -> SchemaResult<Row<RealColumn>> {
        let record = self.record(model)?;
        Ok(filter_row(&record.real, views, &self.config.wildcard_view))
    }

    /// Virtual columns visible under any of `views`.
    pub fn get_virtual_row(
        &self,
        model: EntityType,
        views: &[&str],
    ) -> SchemaResult<Row<VirtualColumn>> {
        let record = self.record(model)?;
        Ok(filter_row(
            &record.virtual_columns,
            views,
            &self.config.wildcard_view,
        ))
    }

    /// Like `get_real_row`, but `None` when `model` is not an entity
    pub fn try_real_row(&self, model: EntityType, views: &[&str]) -> Option<Row<RealColumn>> {
        self.get_real_row(model, views).ok()
    }

    /// Like `get_virtual_row`, but `None` when `model` is not an entity
    pub fn try_virtual_row(&self, model: EntityType, views: &[&str]) -> Option<Row<VirtualColumn>> {
        self.get_virtual_row(model, views).ok()
    }

    pub fn get_real_column(&self, model: EntityType, name: &str) -> SchemaResult<RealColumn> {
        let record = self.record(model)?;
        record
            .real_column(name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_column(&record.name, name))
    }

    pub fn get_virtual_column(&self, model: EntityType, name: &str) -> SchemaResult<VirtualColumn> {
        let record = self.record(model)?;
        record
            .virtual_column(name)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_column(&record.name, name))
    }

    pub fn get_primary_column(&self, model: EntityType) -> SchemaResult<RealColumn> {
        let record = self.record(model)?;
        let primary = record
            .primary
            .as_deref()
            .ok_or_else(|| SchemaError::missing_primary(&record.name))?;
        self.get_real_column(model, primary)
    }

    pub fn get_storage_name(&self, model: EntityType) -> SchemaResult<String> {
        Ok(self.record(model)?.name.clone())
    }

    /// JSON description of a storage record
    pub fn describe(&self, model: EntityType) -> SchemaResult<Value> {
        let record = self.record(model)?;
        serde_json::to_value(record).map_err(|e| SchemaError::entity_decode(&record.name, e))
    }
}

fn apply_property(record: &mut StorageRecord, property: &str, annotation: &Annotation) -> SchemaResult<()> {
    match annotation {
        Annotation::Alias(alias) => record.core_mut(property).alias = Some(alias.clone()),
        Annotation::Views(views) => record.core_mut(property).views = views.clone(),
        Annotation::Hidden => record.core_mut(property).hidden = true,
        Annotation::Convert(converter) => {
            record.real_column_mut(property)?.converter = Some(converter.clone())
        }
        Annotation::Required => record.real_column_mut(property)?.required = true,
        Annotation::Unique => record.real_column_mut(property)?.unique = true,
        Annotation::ReadOnly => {
            let storage = record.name.clone();
            let column = record.real_column_mut(property)?;
            if column.write_only {
                return Err(SchemaError::read_write_conflict(storage, property));
            }
            column.read_only = true;
        }
        Annotation::WriteOnly => {
            let storage = record.name.clone();
            let column = record.real_column_mut(property)?;
            if column.read_only {
                return Err(SchemaError::read_write_conflict(storage, property));
            }
            column.write_only = true;
        }
        Annotation::Primary => {
            record.real_column_mut(property)?;
            record.primary = Some(property.to_string());
        }
        Annotation::Format(format) => format.merge_into(record.real_column_mut(property)?),
        // Routed by the registry before reaching a record
        Annotation::Entity(_) | Annotation::Join(_) => {}
    }
    Ok(())
}

fn filter_row<C: Column>(columns: &[C], views: &[&str], wildcard: &str) -> Row<C> {
    Row::new(
        columns
            .iter()
            .filter(|column| column.core().is_view(views, wildcard))
            .cloned()
            .collect(),
    )
}

/// Fluent declaration of one entity type.
///
/// Stops applying annotations at the first failure, which `finish()` returns.
pub struct Declaration<'r> {
    registry: &'r mut SchemaRegistry,
    model: EntityType,
    error: Option<SchemaError>,
}

impl<'r> Declaration<'r> {
    /// Sets the storage name
    pub fn storage(mut self, name: impl Into<String>) -> Self {
        if self.error.is_none() {
            if let Err(err) = self.registry.annotate_type(self.model, &entity(name)) {
                self.error = Some(err);
            }
        }
        self
    }

    /// Applies annotations to one property
    pub fn column<I>(mut self, property: &str, annotations: I) -> Self
    where
        I: IntoIterator<Item = Annotation>,
    {
        if self.error.is_none() {
            if let Err(err) = self.registry.declare(self.model, property, annotations) {
                self.error = Some(err);
            }
        }
        self
    }

    pub fn finish(self) -> SchemaResult<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
