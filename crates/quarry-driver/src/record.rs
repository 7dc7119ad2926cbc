//! Row data passed to and from CRUD statements.

use quarry_query::{SqlValue, ToSqlValue};

/// An ordered column to value mapping.
///
/// Order is the insertion order, which fixes the column order of generated
/// INSERT and UPDATE statements. Setting an existing column replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value, replacing any previous value for that column.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        let column = column.into();
        let value = value.to_sql_value();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    /// Looks up a column value.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Returns the column names in insertion order.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.fields.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Iterates over the column/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, SqlValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record = record.set(column, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_order() {
        let record = Record::new().set("b", 1_i64).set("a", 2_i64);
        assert_eq!(record.columns(), vec!["b", "a"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let record = Record::new().set("a", 1_i64).set("b", 2_i64).set("a", 3_i64);
        assert_eq!(record.columns(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn test_null_and_option() {
        let record = Record::new().set("x", Option::<i64>::None);
        assert_eq!(record.get("x"), Some(&SqlValue::Null));
        assert_eq!(record.get("missing"), None);
    }
}
