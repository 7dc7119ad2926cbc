//! Foreign key definitions.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::types::ForeignKeyAction;

/// A foreign key from the owning table to a referred table.
///
/// Local and referred column lists are ordered and must be equally long
/// (composite keys pair up positionally). The name may be left unset, in
/// which case it derives as `<table>_<col1>_..._fkey` once the owning table
/// is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    name: Option<String>,
    columns: Vec<String>,
    referred_table: String,
    referred_columns: Vec<String>,
    on_update: ForeignKeyAction,
    on_delete: ForeignKeyAction,
}

impl ForeignKey {
    /// Creates a foreign key; rejects empty or mismatched column lists.
    pub fn new(
        columns: Vec<String>,
        referred_table: impl Into<String>,
        referred_columns: Vec<String>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(SchemaError::EmptyColumnList("ForeignKey"));
        }
        if columns.len() != referred_columns.len() {
            return Err(SchemaError::ColumnCountMismatch {
                local: columns.len(),
                referred: referred_columns.len(),
            });
        }
        Ok(Self {
            name: None,
            columns,
            referred_table: referred_table.into(),
            referred_columns,
            on_update: ForeignKeyAction::default(),
            on_delete: ForeignKeyAction::default(),
        })
    }

    /// Creates a single-column foreign key.
    pub fn single(
        column: impl Into<String>,
        referred_table: impl Into<String>,
        referred_column: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            vec![column.into()],
            referred_table,
            vec![referred_column.into()],
        )
    }

    /// Sets an explicit constraint name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
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
            None => format!("{table}_{}_fkey", self.columns.join("_")),
        }
    }

    /// Returns the local column names, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the referred table name.
    #[must_use]
    pub fn referred_table(&self) -> &str {
        &self.referred_table
    }

    /// Returns the referred column names, in order.
    #[must_use]
    pub fn referred_columns(&self) -> &[String] {
        &self.referred_columns
    }

    /// Returns the ON UPDATE action.
    #[must_use]
    pub fn update_action(&self) -> ForeignKeyAction {
        self.on_update
    }

    /// Returns the ON DELETE action.
    #[must_use]
    pub fn delete_action(&self) -> ForeignKeyAction {
        self.on_delete
    }

    /// Returns whether the key references the named local column.
    #[must_use]
    pub fn references(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_lengths_must_match() {
        let ok = ForeignKey::new(
            vec![String::from("a"), String::from("b")],
            "other",
            vec![String::from("x"), String::from("y")],
        );
        assert!(ok.is_ok());

        let err = ForeignKey::new(
            vec![String::from("a"), String::from("b")],
            "other",
            vec![String::from("x")],
        );
        assert_eq!(
            err,
            Err(SchemaError::ColumnCountMismatch {
                local: 2,
                referred: 1
            })
        );
    }

    #[test]
    fn test_derived_name() {
        let fk = ForeignKey::single("user_id", "users", "id").unwrap();
        assert_eq!(fk.name_in("orders"), "orders_user_id_fkey");
    }

    #[test]
    fn test_composite_derived_name() {
        let fk = ForeignKey::new(
            vec![String::from("a"), String::from("b")],
            "other",
            vec![String::from("x"), String::from("y")],
        )
        .unwrap();
        assert_eq!(fk.name_in("t"), "t_a_b_fkey");
    }

    #[test]
    fn test_actions_default_to_restrict() {
        let fk = ForeignKey::single("user_id", "users", "id").unwrap();
        assert_eq!(fk.update_action(), ForeignKeyAction::Restrict);
        assert_eq!(fk.delete_action(), ForeignKeyAction::Restrict);

        let fk = fk
            .on_update(ForeignKeyAction::Cascade)
            .on_delete(ForeignKeyAction::SetNull);
        assert_eq!(fk.update_action(), ForeignKeyAction::Cascade);
        assert_eq!(fk.delete_action(), ForeignKeyAction::SetNull);
    }

    #[test]
    fn test_empty_columns_rejected() {
        assert_eq!(
            ForeignKey::new(vec![], "other", vec![]),
            Err(SchemaError::EmptyColumnList("ForeignKey"))
        );
    }
}
