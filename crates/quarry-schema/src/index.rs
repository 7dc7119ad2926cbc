//! Index definitions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Index kinds. A table holds at most one `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Primary key.
    Primary,
    /// Unique index.
    Unique,
    /// Plain index.
    Index,
}

/// An index over an ordered set of columns.
///
/// The name may be left unset, in which case it derives as
/// `<table>_<col1>_..._key` once the owning table is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    name: Option<String>,
    index_type: IndexType,
    columns: Vec<String>,
}

impl Index {
    /// Creates an index; rejects an empty column list.
    pub fn new(index_type: IndexType, columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumnList("Index"));
        }
        Ok(Self {
            name: None,
            index_type,
            columns,
        })
    }

    /// Creates a primary index over the given columns.
    pub fn primary(columns: Vec<String>) -> Result<Self> {
        Self::new(IndexType::Primary, columns)
    }

    /// Creates a unique index over the given columns.
    pub fn unique(columns: Vec<String>) -> Result<Self> {
        Self::new(IndexType::Unique, columns)
    }

    /// Creates a plain index over the given columns.
    pub fn plain(columns: Vec<String>) -> Result<Self> {
        Self::new(IndexType::Index, columns)
    }

    /// Sets an explicit name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the explicit name, if set.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the effective name within the given table.
    #[must_use]
    pub fn name_in(&self, table: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{table}_{}_key", self.columns.join("_")),
        }
    }

    /// Returns the index type.
    #[must_use]
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Returns whether this is the primary index.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.index_type == IndexType::Primary
    }

    /// Returns the referenced column names, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns whether the index references the named column.
    #[must_use]
    pub fn references(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}
