//! Storage records
//!
//! One record per entity type: storage name, primary column, and the real
//! and virtual column maps. A property name lives in at most one map.

use serde::Serialize;

use super::column::{Column, ColumnCore, RealColumn, VirtualColumn};
use super::errors::{SchemaError, SchemaResult};

/// Metadata for one entity type
#[derive(Debug, Clone, Serialize)]
pub struct StorageRecord {
    /// Storage or collection name
    pub name: String,
    /// Name of the primary real column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    /// Real columns in declaration order
    pub real: Vec<RealColumn>,
    /// Virtual columns in declaration order
    #[serde(rename = "virtual")]
    pub virtual_columns: Vec<VirtualColumn>,
}

impl StorageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: None,
            real: Vec::new(),
            virtual_columns: Vec::new(),
        }
    }

    pub fn real_column(&self, name: &str) -> Option<&RealColumn> {
        self.real.iter().find(|c| c.name() == name)
    }

    pub fn virtual_column(&self, name: &str) -> Option<&VirtualColumn> {
        self.virtual_columns.iter().find(|c| c.name() == name)
    }

    pub fn is_real(&self, name: &str) -> bool {
        self.real_column(name).is_some()
    }

    pub fn is_virtual(&self, name: &str) -> bool {
        self.virtual_column(name).is_some()
    }

    /// Returns the real column for `name`, creating it on first use.
    ///
    /// Fails if the name is already a virtual column.
    pub fn real_column_mut(&mut self, name: &str) -> SchemaResult<&mut RealColumn> {
        if self.is_virtual(name) {
            return Err(SchemaError::column_kind_conflict(&self.name, name, "virtual"));
        }
        let index = match self.real.iter().position(|c| c.name() == name) {
            Some(index) => index,
            None => {
                self.real.push(RealColumn::new(name));
                self.real.len() - 1
            }
        };
        Ok(&mut self.real[index])
    }

    /// Returns the shared metadata of the column `name` of either kind,
    /// creating a real column if neither exists.
    pub fn core_mut(&mut self, name: &str) -> &mut ColumnCore {
        if let Some(index) = self.virtual_columns.iter().position(|c| c.name() == name) {
            return &mut self.virtual_columns[index].core;
        }
        let index = match self.real.iter().position(|c| c.name() == name) {
            Some(index) => index,
            None => {
                self.real.push(RealColumn::new(name));
                self.real.len() - 1
            }
        };
        &mut self.real[index].core
    }

    /// Total number of columns of both kinds
    pub fn column_count(&self) -> usize {
        self.real.len() + self.virtual_columns.len()
    }

    /// Returns the virtual column for `name`, creating it with `init` on
    /// first use.
    ///
    /// Fails if the name is already a real column.
    pub fn virtual_column_mut<F>(&mut self, name: &str, init: F) -> SchemaResult<&mut VirtualColumn>
    where
        F: FnOnce() -> VirtualColumn,
    {
        if self.is_real(name) {
            return Err(SchemaError::column_kind_conflict(&self.name, name, "real"));
        }
        let index = match self.virtual_columns.iter().position(|c| c.name() == name) {
            Some(index) => index,
            None => {
                self.virtual_columns.push(init());
                self.virtual_columns.len() - 1
            }
        };
        Ok(&mut self.virtual_columns[index])
    }
}
