//! Table definitions.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{Result, SchemaError};
use crate::foreign_key::ForeignKey;
use crate::index::{Index, IndexType};

/// A named table: ordered columns, indexes, and foreign keys.
///
/// Every mutator re-checks the structural invariants (unique column names,
/// at most one primary index, no dangling index/foreign-key columns) and
/// leaves the table unchanged on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Returns the indexes in declaration order.
    #[must_use]
    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// Returns the primary index, if one is declared.
    #[must_use]
    pub fn primary(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.is_primary())
    }

    /// Returns the foreign keys in declaration order.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Adds a column; fails on a duplicate name.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if self.get_column(column.name()).is_some() {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: String::from(column.name()),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Removes a column by name.
    ///
    /// Fails when the column is unknown or still referenced by an index or
    /// foreign key, naming the blockers; the column set is unchanged on
    /// failure.
    pub fn remove_column(&mut self, name: &str) -> Result<Column> {
        let position = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: self.name.clone(),
                column: String::from(name),
            })?;

        let blockers: Vec<String> = self
            .indexes
            .iter()
            .filter(|i| i.references(name))
            .map(|i| i.name_in(&self.name))
            .chain(
                self.foreign_keys
                    .iter()
                    .filter(|fk| fk.references(name))
                    .map(|fk| fk.name_in(&self.name)),
            )
            .collect();
        if !blockers.is_empty() {
            return Err(SchemaError::ColumnInUse {
                table: self.name.clone(),
                column: String::from(name),
                blockers,
            });
        }

        Ok(self.columns.remove(position))
    }

    /// Adds an index; fails if a second primary is declared or a referenced
    /// column does not exist.
    pub fn add_index(&mut self, index: Index) -> Result<()> {
        if index.index_type() == IndexType::Primary && self.primary().is_some() {
            return Err(SchemaError::PrimaryIndexExists(self.name.clone()));
        }
        self.check_columns_exist(index.columns())?;
        self.indexes.push(index);
        Ok(())
    }

    /// Removes an index by its effective name.
    pub fn remove_index(&mut self, name: &str) -> Result<Index> {
        let position = self
            .indexes
            .iter()
            .position(|i| i.name_in(&self.name) == name)
            .ok_or_else(|| SchemaError::UnknownIndex {
                table: self.name.clone(),
                index: String::from(name),
            })?;
        Ok(self.indexes.remove(position))
    }

    /// Adds a foreign key; fails if a local column does not exist.
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) -> Result<()> {
        self.check_columns_exist(foreign_key.columns())?;
        self.foreign_keys.push(foreign_key);
        Ok(())
    }

    /// Removes a foreign key by its effective name.
    pub fn remove_foreign_key(&mut self, name: &str) -> Result<ForeignKey> {
        let position = self
            .foreign_keys
            .iter()
            .position(|fk| fk.name_in(&self.name) == name)
            .ok_or_else(|| SchemaError::UnknownForeignKey {
                table: self.name.clone(),
                foreign_key: String::from(name),
            })?;
        Ok(self.foreign_keys.remove(position))
    }

    fn check_columns_exist(&self, columns: &[String]) -> Result<()> {
        for column in columns {
            if self.get_column(column).is_none() {
                return Err(SchemaError::UnknownColumn {
                    table: self.name.clone(),
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    fn users() -> Table {
        let mut t = Table::new("users");
        t.add_column(Column::new("id", SqlType::BigInt).serial())
            .unwrap();
        t.add_column(Column::new("name", SqlType::Varchar(255)).not_null())
            .unwrap();
        t.add_column(Column::new("email", SqlType::Varchar(255)))
            .unwrap();
        t.add_index(Index::primary(vec![String::from("id")]).unwrap())
            .unwrap();
        t
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut t = users();
        let err = t.add_column(Column::new("name", SqlType::Text));
        assert_eq!(
            err,
            Err(SchemaError::DuplicateColumn {
                table: String::from("users"),
                column: String::from("name"),
            })
        );
        assert_eq!(t.columns().len(), 3);
    }

    #[test]
    fn test_second_primary_rejected() {
        let mut t = users();
        let err = t.add_index(Index::primary(vec![String::from("email")]).unwrap());
        assert_eq!(
            err,
            Err(SchemaError::PrimaryIndexExists(String::from("users")))
        );
        assert_eq!(t.indexes().len(), 1);
    }

    #[test]
    fn test_index_over_unknown_column_rejected() {
        let mut t = users();
        let err = t.add_index(Index::unique(vec![String::from("missing")]).unwrap());
        assert!(matches!(err, Err(SchemaError::UnknownColumn { .. })));
    }

    #[test]
    fn test_remove_referenced_column_fails_and_preserves_state() {
        let mut t = users();
        t.add_index(Index::unique(vec![String::from("email")]).unwrap())
            .unwrap();

        let before = t.columns().to_vec();
        let err = t.remove_column("email").unwrap_err();
        assert_eq!(
            err,
            SchemaError::ColumnInUse {
                table: String::from("users"),
                column: String::from("email"),
                blockers: vec![String::from("users_email_key")],
            }
        );
        assert_eq!(t.columns(), before.as_slice());
    }

    #[test]
    fn test_remove_column_blocked_by_foreign_key() {
        let mut t = Table::new("orders");
        t.add_column(Column::new("id", SqlType::BigInt).serial())
            .unwrap();
        t.add_column(Column::new("user_id", SqlType::BigInt).not_null())
            .unwrap();
        t.add_foreign_key(ForeignKey::single("user_id", "users", "id").unwrap())
            .unwrap();

        let err = t.remove_column("user_id").unwrap_err();
        assert!(matches!(err, SchemaError::ColumnInUse { blockers, .. }
            if blockers == vec![String::from("orders_user_id_fkey")]));
    }

    #[test]
    fn test_remove_unreferenced_column() {
        let mut t = users();
        let removed = t.remove_column("email").unwrap();
        assert_eq!(removed.name(), "email");
        assert!(t.get_column("email").is_none());
    }

    #[test]
    fn test_remove_index_then_column() {
        let mut t = users();
        t.remove_index("users_id_key").unwrap();
        assert!(t.primary().is_none());
        assert!(t.remove_column("id").is_ok());
    }

    #[test]
    fn test_remove_unknown_index() {
        let mut t = users();
        assert!(matches!(
            t.remove_index("nope"),
            Err(SchemaError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_foreign_key_requires_local_columns() {
        let mut t = users();
        let fk = ForeignKey::single("missing", "other", "id").unwrap();
        assert!(matches!(
            t.add_foreign_key(fk),
            Err(SchemaError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_serde_round_trip() {
        let t = users();
        let json = serde_json::to_string(&t).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
