//! In-memory registry of table definitions.

use std::collections::BTreeMap;

use crate::error::{Result, SchemaError};
use crate::table::Table;

/// Holds the known table definitions, keyed by table name.
///
/// Acts as a cache for definitions loaded from the database or built in
/// code. Registration rejects duplicates rather than silently replacing.
#[derive(Debug, Clone, Default)]
pub struct TableRepository {
    tables: BTreeMap<String, Table>,
}

impl TableRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table definition; fails if the name is already taken.
    pub fn register(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(SchemaError::DuplicateTable(String::from(table.name())));
        }
        self.tables.insert(String::from(table.name()), table);
        Ok(())
    }

    /// Looks up a table by name.
    pub fn get(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::UnknownTable(String::from(name)))
    }

    /// Looks up a table for modification.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| SchemaError::UnknownTable(String::from(name)))
    }

    /// Returns whether a table is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Removes a table definition, returning it.
    pub fn remove(&mut self, name: &str) -> Result<Table> {
        self.tables
            .remove(name)
            .ok_or_else(|| SchemaError::UnknownTable(String::from(name)))
    }

    /// Drops all registered definitions.
    pub fn reset(&mut self) {
        self.tables.clear();
    }

    /// Returns the registered table names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Returns the number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
