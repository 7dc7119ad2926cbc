//! Render-time parameter context.

use crate::clause::TableClause;
use crate::dialect::Dialect;
use crate::value::SqlValue;

/// Context threaded through one top-level statement render.
///
/// Holds the active dialect, the default table for unqualified field
/// references, and the growing ordered map of generated placeholder names
/// (`col1`, `col2`, ...) to bound values. The counter is local to the
/// instance: rendering the same tree against two `Parameters` produces
/// independent numbering. Never share an instance between renders of
/// different statements.
pub struct Parameters<'a> {
    dialect: &'a dyn Dialect,
    default_table: Option<TableClause>,
    values: Vec<(String, SqlValue)>,
    counter: usize,
}

impl<'a> Parameters<'a> {
    /// Creates a fresh context for one statement render.
    #[must_use]
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            default_table: None,
            values: Vec::new(),
            counter: 0,
        }
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect
    }

    /// Binds a value under the next sequential name and returns the
    /// placeholder text to splice into the SQL.
    pub fn assign(&mut self, value: SqlValue) -> String {
        self.counter += 1;
        let name = format!("col{}", self.counter);
        let placeholder = self.dialect.placeholder(&name, self.counter);
        self.values.push((name, value));
        placeholder
    }

    /// Looks up a bound value by placeholder name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns the bound values in placeholder-allocation order.
    #[must_use]
    pub fn values(&self) -> &[(String, SqlValue)] {
        &self.values
    }

    /// Consumes the context and returns the ordered bindings.
    #[must_use]
    pub fn into_values(self) -> Vec<(String, SqlValue)> {
        self.values
    }

    /// Returns the number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no values have been bound yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the table used to qualify unadorned field references.
    #[must_use]
    pub fn default_table(&self) -> Option<&TableClause> {
        self.default_table.as_ref()
    }

    /// Replaces the default table, returning the previous one so nested
    /// renders can restore it.
    pub fn set_default_table(&mut self, table: Option<TableClause>) -> Option<TableClause> {
        std::mem::replace(&mut self.default_table, table)
    }
}
