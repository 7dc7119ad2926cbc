//! The backend contract.
//!
//! [`Driver`] covers everything that can be answered without touching a
//! connection: identifier quoting, table-name prefixing, and the rendering
//! of CRUD and DDL statements into the driver's dialect. Execution and
//! introspection live on the concrete drivers, which also override the
//! generation methods their backend renders differently.

use quarry_query::{CompareOp, Dialect, Direction, Expression, Parameters, QueryError, SqlValue};
use quarry_schema::{Column, ForeignKey, Index, IndexType, SqlType, Table};

use crate::condition::{FieldMatch, OrderSpec, WhereSpec};
use crate::error::{DriverError, Result};
use crate::record::Record;

/// Statement generation for one database backend.
pub trait Driver {
    /// Returns the rendering dialect.
    fn dialect(&self) -> &dyn Dialect;

    /// Returns the configured table-name prefix.
    fn table_prefix(&self) -> &str;

    /// Quotes an identifier in the dialect's quote character.
    fn ident_quote(&self, name: &str) -> String {
        self.dialect().ident_quote(name)
    }

    /// Prefixes and quotes a table name.
    fn table_name(&self, name: &str) -> String {
        self.ident_quote(&format!("{}{}", self.table_prefix(), name))
    }

    /// Maps a schema type to the dialect's type name.
    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => String::from("INTEGER"),
            SqlType::BigInt => String::from("BIGINT"),
            SqlType::SmallInt => String::from("SMALLINT"),
            SqlType::Text => String::from("TEXT"),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Char(n) => format!("CHAR({n})"),
            SqlType::Boolean => String::from("BOOLEAN"),
            SqlType::DateTime => String::from("TIMESTAMP"),
            SqlType::Date => String::from("DATE"),
            SqlType::Real => String::from("REAL"),
            SqlType::Double => String::from("DOUBLE PRECISION"),
            SqlType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            SqlType::Blob => String::from("BLOB"),
        }
    }

    /// Renders a column definition for CREATE TABLE and ADD COLUMN.
    fn column_definition(&self, column: &Column) -> String {
        let mut def = format!(
            "{} {}",
            self.ident_quote(column.name()),
            self.type_name(column.sql_type())
        );
        if !column.is_nullable() {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = column.default_value().to_sql() {
            def.push_str(" DEFAULT ");
            def.push_str(&default);
        }
        def
    }

    /// Renders a WHERE condition, binding values into `params`.
    ///
    /// NULL matches become IS NULL / IS NOT NULL; any other operator paired
    /// with NULL is an error.
    fn get_where(&self, spec: &WhereSpec, params: &mut Parameters<'_>) -> Result<String> {
        match spec {
            WhereSpec::Raw(sql) => Ok(sql.clone()),
            WhereSpec::Expression(expr) => Ok(expr.to_sql(params)?),
            WhereSpec::Fields(fields) => {
                let mut combined: Option<Expression> = None;
                for (column, matcher) in fields {
                    let (op, value) = match matcher {
                        FieldMatch::Value(value) => (CompareOp::Eq, value.clone()),
                        FieldMatch::Op(op, value) => (CompareOp::parse(op)?, value.clone()),
                    };
                    let clause =
                        Expression::field(column.clone()).compare(op, Expression::Value(value));
                    combined = Some(match combined {
                        Some(left) => left.and(clause),
                        None => clause,
                    });
                }
                let combined = combined.ok_or(DriverError::Query(QueryError::EmptyBoolean))?;
                Ok(combined.to_sql(params)?)
            }
        }
    }

    /// Renders an ORDER BY clause, validating directions.
    fn get_order(&self, spec: &OrderSpec) -> Result<String> {
        match spec {
            OrderSpec::Raw(sql) => Ok(format!("ORDER BY {sql}")),
            OrderSpec::Columns(terms) => {
                let rendered: Vec<String> = terms
                    .iter()
                    .map(|term| {
                        let direction = Direction::parse(&term.direction)
                            .map_err(|_| DriverError::UnknownDirection(term.direction.clone()))?;
                        Ok(format!(
                            "{} {}",
                            self.ident_quote(&term.column),
                            direction.as_str()
                        ))
                    })
                    .collect::<Result<_>>()?;
                Ok(format!("ORDER BY {}", rendered.join(", ")))
            }
        }
    }

    /// Renders a SELECT statement. An empty field list selects `*`.
    fn select_sql(
        &self,
        table: &str,
        fields: &[&str],
        condition: Option<&WhereSpec>,
        order: Option<&OrderSpec>,
        params: &mut Parameters<'_>,
    ) -> Result<String> {
        let field_list = if fields.is_empty() {
            String::from("*")
        } else {
            fields
                .iter()
                .map(|f| self.ident_quote(f))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", field_list, self.table_name(table));
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.get_where(condition, params)?);
        }
        if let Some(order) = order {
            sql.push(' ');
            sql.push_str(&self.get_order(order)?);
        }
        Ok(sql)
    }

    /// Renders an INSERT statement for the record's columns.
    fn insert_sql(&self, table: &str, record: &Record, params: &mut Parameters<'_>) -> String {
        if record.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", self.table_name(table));
        }
        let mut columns = Vec::with_capacity(record.len());
        let mut placeholders = Vec::with_capacity(record.len());
        for (column, value) in record.iter() {
            columns.push(self.ident_quote(column));
            placeholders.push(params.assign(value.clone()));
        }
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name(table),
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    /// Renders an UPDATE statement.
    fn update_sql(
        &self,
        table: &str,
        record: &Record,
        condition: Option<&WhereSpec>,
        params: &mut Parameters<'_>,
    ) -> Result<String> {
        let assignments: Vec<String> = record
            .iter()
            .map(|(column, value)| {
                format!("{} = {}", self.ident_quote(column), params.assign(value.clone()))
            })
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table_name(table),
            assignments.join(", ")
        );
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.get_where(condition, params)?);
        }
        Ok(sql)
    }

    /// Renders a DELETE statement.
    fn delete_sql(
        &self,
        table: &str,
        condition: Option<&WhereSpec>,
        params: &mut Parameters<'_>,
    ) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", self.table_name(table));
        if let Some(condition) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(&self.get_where(condition, params)?);
        }
        Ok(sql)
    }

    /// Renders the statement removing all rows from a table.
    fn truncate_sql(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.table_name(table))
    }

    /// Renders an INSERT with conflict resolution on the given columns.
    ///
    /// Conflicting rows have their non-conflict columns updated to the
    /// incoming values; a record with only conflict columns renders DO
    /// NOTHING.
    fn upsert_sql(
        &self,
        table: &str,
        record: &Record,
        conflict_columns: &[&str],
        params: &mut Parameters<'_>,
    ) -> String {
        let insert = self.insert_sql(table, record, params);
        let conflict_list = conflict_columns
            .iter()
            .map(|c| self.ident_quote(c))
            .collect::<Vec<_>>()
            .join(", ");
        let updates: Vec<String> = record
            .iter()
            .filter(|(column, _)| !conflict_columns.contains(column))
            .map(|(column, _)| {
                let quoted = self.ident_quote(column);
                format!("{quoted} = excluded.{quoted}")
            })
            .collect();
        if updates.is_empty() {
            format!("{insert} ON CONFLICT ({conflict_list}) DO NOTHING")
        } else {
            format!(
                "{insert} ON CONFLICT ({conflict_list}) DO UPDATE SET {}",
                updates.join(", ")
            )
        }
    }

    /// Renders the statements creating a table and its secondary indexes.
    ///
    /// The primary index and the foreign keys become table constraints;
    /// unique and plain indexes become separate CREATE INDEX statements.
    fn create_table_sql(&self, table: &Table) -> Result<Vec<String>> {
        let mut body: Vec<String> = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        if let Some(primary) = table.primary() {
            body.push(format!(
                "PRIMARY KEY ({})",
                self.column_list(primary.columns())
            ));
        }
        for fk in table.foreign_keys() {
            body.push(self.foreign_key_clause(table.name(), fk));
        }
        let mut statements = vec![format!(
            "CREATE TABLE {} ({})",
            self.table_name(table.name()),
            body.join(", ")
        )];
        for index in table.indexes().iter().filter(|i| !i.is_primary()) {
            statements.push(self.create_index_sql(table.name(), index)?);
        }
        Ok(statements)
    }

    /// Renders a DROP TABLE statement.
    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE {}", self.table_name(table))
    }

    /// Renders a CREATE INDEX statement.
    ///
    /// A primary index cannot be created after the table exists.
    fn create_index_sql(&self, table: &str, index: &Index) -> Result<String> {
        let keyword = match index.index_type() {
            IndexType::Primary => {
                return Err(DriverError::Unsupported {
                    dialect: self.dialect().name(),
                    operation: "adding a primary key to an existing table",
                });
            }
            IndexType::Unique => "CREATE UNIQUE INDEX",
            IndexType::Index => "CREATE INDEX",
        };
        Ok(format!(
            "{} {} ON {} ({})",
            keyword,
            self.ident_quote(&index.name_in(table)),
            self.table_name(table),
            self.column_list(index.columns())
        ))
    }

    /// Renders a DROP INDEX statement.
    fn drop_index_sql(&self, _table: &str, name: &str) -> Result<String> {
        Ok(format!("DROP INDEX {}", self.ident_quote(name)))
    }

    /// Renders the statement adding a foreign key to an existing table.
    fn create_foreign_key_sql(&self, table: &str, fk: &ForeignKey) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD {}",
            self.table_name(table),
            self.foreign_key_clause(table, fk)
        ))
    }

    /// Renders the statement dropping a foreign key constraint.
    fn drop_foreign_key_sql(&self, table: &str, name: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.table_name(table),
            self.ident_quote(name)
        ))
    }

    /// Renders the statements making an existing column auto-increment.
    fn create_serial_sql(&self, _table: &str, _column: &str) -> Result<Vec<String>> {
        Err(DriverError::Unsupported {
            dialect: self.dialect().name(),
            operation: "adding a serial to an existing column",
        })
    }

    /// Renders the statements removing auto-increment from a column.
    fn drop_serial_sql(&self, _table: &str, _column: &str) -> Result<Vec<String>> {
        Err(DriverError::Unsupported {
            dialect: self.dialect().name(),
            operation: "removing a serial from a column",
        })
    }

    /// Renders an ADD COLUMN statement.
    fn add_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.table_name(table),
            self.column_definition(column)
        )
    }

    /// Renders a DROP COLUMN statement.
    fn remove_column_sql(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.table_name(table),
            self.ident_quote(column)
        )
    }

    /// Quotes and joins a column list.
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.ident_quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Renders a FOREIGN KEY table constraint.
    fn foreign_key_clause(&self, table: &str, fk: &ForeignKey) -> String {
        format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            self.ident_quote(&fk.name_in(table)),
            self.column_list(fk.columns()),
            self.table_name(fk.referred_table()),
            self.column_list(fk.referred_columns()),
            fk.update_action().to_sql(),
            fk.delete_action().to_sql()
        )
    }
}

/// Converts the bound values of a finished render into bind order.
#[must_use]
pub fn bind_order(params: Parameters<'_>) -> Vec<SqlValue> {
    params
        .into_values()
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::OrderTerm;
    use quarry_query::AnsiDialect;

    struct AnsiDriver;

    impl Driver for AnsiDriver {
        fn dialect(&self) -> &dyn Dialect {
            &AnsiDialect
        }

        fn table_prefix(&self) -> &str {
            ""
        }
    }

    fn params() -> Parameters<'static> {
        Parameters::new(&AnsiDialect)
    }

    #[test]
    fn test_get_where_null_value() {
        let d = AnsiDriver;
        let mut p = params();
        let spec = WhereSpec::fields().field("a", FieldMatch::value(Option::<i64>::None));
        assert_eq!(d.get_where(&spec, &mut p).unwrap(), "\"a\" IS NULL");
        assert!(p.is_empty());
    }

    #[test]
    fn test_get_where_not_null() {
        let d = AnsiDriver;
        let mut p = params();
        let spec = WhereSpec::fields().field("a", FieldMatch::op("!=", Option::<i64>::None));
        assert_eq!(d.get_where(&spec, &mut p).unwrap(), "\"a\" IS NOT NULL");
    }

    #[test]
    fn test_get_where_binds_value() {
        let d = AnsiDriver;
        let mut p = params();
        let spec = WhereSpec::fields().field("a", FieldMatch::value(5_i64));
        assert_eq!(d.get_where(&spec, &mut p).unwrap(), "\"a\" = :col1");
        assert_eq!(p.get("col1"), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn test_get_where_combines_with_and() {
        let d = AnsiDriver;
        let mut p = params();
        let spec = WhereSpec::fields()
            .field("a", FieldMatch::value(1_i64))
            .field("b", FieldMatch::op(">", 2_i64));
        assert_eq!(
            d.get_where(&spec, &mut p).unwrap(),
            "\"a\" = :col1 AND \"b\" > :col2"
        );
    }

    #[test]
    fn test_get_where_null_with_less_than_fails() {
        let d = AnsiDriver;
        let mut p = params();
        let spec = WhereSpec::fields().field("a", FieldMatch::op("<", Option::<i64>::None));
        assert!(matches!(
            d.get_where(&spec, &mut p),
            Err(DriverError::Query(QueryError::NullComparison(_)))
        ));
    }

    #[test]
    fn test_get_order() {
        let d = AnsiDriver;
        let spec = OrderSpec::columns(vec![
            OrderTerm::ascending("a"),
            OrderTerm::descending("b"),
        ]);
        assert_eq!(d.get_order(&spec).unwrap(), "ORDER BY \"a\" ASC, \"b\" DESC");
    }

    #[test]
    fn test_get_order_rejects_unknown_direction() {
        let d = AnsiDriver;
        let spec = OrderSpec::columns(vec![OrderTerm::new("a", "SIDEWAYS")]);
        assert!(matches!(
            d.get_order(&spec),
            Err(DriverError::UnknownDirection(dir)) if dir == "SIDEWAYS"
        ));
    }

    #[test]
    fn test_select_sql() {
        let d = AnsiDriver;
        let mut p = params();
        let sql = d
            .select_sql(
                "users",
                &["id", "name"],
                Some(&WhereSpec::fields().field("id", FieldMatch::value(7_i64))),
                Some(&OrderSpec::columns(vec![OrderTerm::ascending("name")])),
                &mut p,
            )
            .unwrap();
        assert_eq!(
            sql,
            "SELECT \"id\", \"name\" FROM \"users\" WHERE \"id\" = :col1 ORDER BY \"name\" ASC"
        );
    }

    #[test]
    fn test_insert_sql() {
        let d = AnsiDriver;
        let mut p = params();
        let record = Record::new().set("name", "alice").set("age", 30_i64);
        assert_eq!(
            d.insert_sql("users", &record, &mut p),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES (:col1, :col2)"
        );
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_update_sql_binds_set_before_where() {
        let d = AnsiDriver;
        let mut p = params();
        let record = Record::new().set("name", "bob");
        let spec = WhereSpec::fields().field("id", FieldMatch::value(1_i64));
        assert_eq!(
            d.update_sql("users", &record, Some(&spec), &mut p).unwrap(),
            "UPDATE \"users\" SET \"name\" = :col1 WHERE \"id\" = :col2"
        );
        assert_eq!(p.get("col1"), Some(&SqlValue::Text(String::from("bob"))));
        assert_eq!(p.get("col2"), Some(&SqlValue::Int(1)));
    }

    #[test]
    fn test_truncate_sql() {
        let d = AnsiDriver;
        assert_eq!(d.truncate_sql("users"), "TRUNCATE TABLE \"users\"");
    }

    #[test]
    fn test_upsert_sql() {
        let d = AnsiDriver;
        let mut p = params();
        let record = Record::new().set("id", 1_i64).set("name", "alice");
        assert_eq!(
            d.upsert_sql("users", &record, &["id"], &mut p),
            "INSERT INTO \"users\" (\"id\", \"name\") VALUES (:col1, :col2) \
             ON CONFLICT (\"id\") DO UPDATE SET \"name\" = excluded.\"name\""
        );
    }

    #[test]
    fn test_table_prefix_applies() {
        struct Prefixed;
        impl Driver for Prefixed {
            fn dialect(&self) -> &dyn Dialect {
                &AnsiDialect
            }
            fn table_prefix(&self) -> &str {
                "app_"
            }
        }
        assert_eq!(Prefixed.table_name("users"), "\"app_users\"");
    }

    #[test]
    fn test_primary_index_after_creation_unsupported() {
        let d = AnsiDriver;
        let index = Index::primary(vec![String::from("id")]).unwrap();
        assert!(matches!(
            d.create_index_sql("users", &index),
            Err(DriverError::Unsupported { .. })
        ));
    }
}
