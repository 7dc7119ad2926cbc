//! Column definitions.

use serde::{Deserialize, Serialize};

use crate::types::{DefaultValue, SqlType};

/// One column of a table.
///
/// Owned exclusively by its [`Table`](crate::Table); validation against
/// sibling columns happens at the table's mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    sql_type: SqlType,
    nullable: bool,
    default: DefaultValue,
    serial: bool,
}

impl Column {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
            default: DefaultValue::None,
            serial: false,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = value;
        self
    }

    /// Marks the column as auto-incrementing. Serial columns are NOT NULL.
    #[must_use]
    pub fn serial(mut self) -> Self {
        self.serial = true;
        self.nullable = false;
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    /// Returns whether the column accepts NULL.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    /// Returns whether the column auto-increments.
    #[must_use]
    pub fn is_serial(&self) -> bool {
        self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = Column::new("id", SqlType::BigInt).serial();
        assert_eq!(col.name(), "id");
        assert!(col.is_serial());
        assert!(!col.is_nullable());
    }

    #[test]
    fn test_column_default() {
        let col = Column::new("active", SqlType::Boolean)
            .not_null()
            .default(DefaultValue::Bool(true));
        assert_eq!(col.default_value(), &DefaultValue::Bool(true));
        assert!(!col.is_nullable());
    }
}
