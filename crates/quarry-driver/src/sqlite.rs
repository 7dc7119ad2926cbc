//! SQLite backend.
//!
//! Statement generation differs from the ANSI base in a few places: serial
//! columns are `INTEGER PRIMARY KEY AUTOINCREMENT` and exist only from
//! table creation, and foreign keys cannot be added to or dropped from an
//! existing table. Introspection reads the `PRAGMA table_info`,
//! `index_list`, `index_info`, and `foreign_key_list` interfaces.

use std::collections::BTreeMap;

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column as _, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use quarry_query::{Dialect, Parameters, SqlValue};
use quarry_schema::{
    Column, DefaultValue, ForeignKey, ForeignKeyAction, Index, SqlType, Table,
};

use crate::condition::{OrderSpec, WhereSpec};
use crate::config::DriverConfig;
use crate::driver::{bind_order, Driver};
use crate::error::{DriverError, Result};
use crate::record::Record;

/// SQLite rendering rules: double-quoted identifiers, `:colN` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

/// Driver over a `sqlx` SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
    config: DriverConfig,
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn table_prefix(&self) -> &str {
        &self.config.table_prefix
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => String::from("INTEGER"),
            SqlType::BigInt => String::from("BIGINT"),
            SqlType::SmallInt => String::from("SMALLINT"),
            SqlType::Text => String::from("TEXT"),
            SqlType::Varchar(n) => format!("VARCHAR({n})"),
            SqlType::Char(n) => format!("CHAR({n})"),
            SqlType::Boolean => String::from("BOOLEAN"),
            SqlType::DateTime => String::from("DATETIME"),
            SqlType::Date => String::from("DATE"),
            SqlType::Real => String::from("REAL"),
            SqlType::Double => String::from("DOUBLE"),
            SqlType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            SqlType::Blob => String::from("BLOB"),
        }
    }

    fn column_definition(&self, column: &Column) -> String {
        if column.is_serial() {
            return format!(
                "{} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL",
                self.ident_quote(column.name())
            );
        }
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

    fn create_table_sql(&self, table: &Table) -> Result<Vec<String>> {
        let serial = table.columns().iter().find(|c| c.is_serial());
        let mut body: Vec<String> = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        match (serial, table.primary()) {
            // The serial column already carries PRIMARY KEY; a second table
            // constraint would be rejected.
            (Some(serial), Some(primary)) => {
                if primary.columns().len() != 1 || primary.columns()[0] != serial.name() {
                    return Err(DriverError::Unsupported {
                        dialect: "sqlite",
                        operation: "a primary key separate from the AUTOINCREMENT column",
                    });
                }
            }
            (Some(_), None) => {}
            (None, Some(primary)) => {
                body.push(format!(
                    "PRIMARY KEY ({})",
                    self.column_list(primary.columns())
                ));
            }
            (None, None) => {}
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

    // SQLite has no TRUNCATE statement.
    fn truncate_sql(&self, table: &str) -> String {
        format!("DELETE FROM {}", self.table_name(table))
    }

    fn create_foreign_key_sql(&self, _table: &str, _fk: &ForeignKey) -> Result<String> {
        Err(DriverError::Unsupported {
            dialect: "sqlite",
            operation: "adding a foreign key to an existing table",
        })
    }

    fn drop_foreign_key_sql(&self, _table: &str, _name: &str) -> Result<String> {
        Err(DriverError::Unsupported {
            dialect: "sqlite",
            operation: "dropping a foreign key constraint",
        })
    }
}

impl SqliteDriver {
    /// Creates a driver with default configuration.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_config(pool, DriverConfig::default())
    }

    /// Creates a driver with explicit configuration.
    #[must_use]
    pub fn with_config(pool: SqlitePool, config: DriverConfig) -> Self {
        Self { pool, config }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn physical_name(&self, table: &str) -> String {
        format!("{}{}", self.config.table_prefix, table)
    }

    async fn run(&self, sql: &str, values: Vec<SqlValue>) -> Result<sqlx::sqlite::SqliteQueryResult> {
        debug!(sql = %sql, "Executing SQL");
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_value(query, value);
        }
        Ok(query.execute(&self.pool).await?)
    }

    /// Executes a statement with bound values, returning rows affected.
    pub async fn execute(&self, sql: &str, values: Vec<SqlValue>) -> Result<u64> {
        Ok(self.run(sql, values).await?.rows_affected())
    }

    /// Inserts a record, returning the rowid of the new row.
    pub async fn insert(&self, table: &str, record: &Record) -> Result<i64> {
        let mut params = Parameters::new(&SqliteDialect);
        let sql = self.insert_sql(table, record, &mut params);
        let result = self.run(&sql, bind_order(params)).await?;
        Ok(result.last_insert_rowid())
    }

    /// Selects matching rows as records.
    pub async fn select(
        &self,
        table: &str,
        fields: &[&str],
        condition: Option<&WhereSpec>,
        order: Option<&OrderSpec>,
    ) -> Result<Vec<Record>> {
        let mut params = Parameters::new(&SqliteDialect);
        let sql = self.select_sql(table, fields, condition, order, &mut params)?;
        debug!(sql = %sql, "Executing SQL");
        let mut query = sqlx::query(&sql);
        for value in bind_order(params) {
            query = bind_value(query, value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    /// Updates matching rows, returning the number affected.
    pub async fn update(
        &self,
        table: &str,
        record: &Record,
        condition: Option<&WhereSpec>,
    ) -> Result<u64> {
        let mut params = Parameters::new(&SqliteDialect);
        let sql = self.update_sql(table, record, condition, &mut params)?;
        self.execute(&sql, bind_order(params)).await
    }

    /// Deletes matching rows, returning the number affected.
    pub async fn delete(&self, table: &str, condition: Option<&WhereSpec>) -> Result<u64> {
        let mut params = Parameters::new(&SqliteDialect);
        let sql = self.delete_sql(table, condition, &mut params)?;
        self.execute(&sql, bind_order(params)).await
    }

    /// Removes all rows from a table, returning the number removed.
    pub async fn truncate(&self, table: &str) -> Result<u64> {
        let sql = self.truncate_sql(table);
        self.execute(&sql, Vec::new()).await
    }

    /// Inserts or updates on conflict, returning rows affected.
    pub async fn upsert(
        &self,
        table: &str,
        record: &Record,
        conflict_columns: &[&str],
    ) -> Result<u64> {
        let mut params = Parameters::new(&SqliteDialect);
        let sql = self.upsert_sql(table, record, conflict_columns, &mut params);
        self.execute(&sql, bind_order(params)).await
    }

    /// Creates a table and its secondary indexes.
    pub async fn create_table(&self, table: &Table) -> Result<()> {
        for sql in self.create_table_sql(table)? {
            info!(sql = %sql, "Applying DDL");
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Drops a table.
    pub async fn drop_table(&self, table: &str) -> Result<()> {
        let sql = self.drop_table_sql(table);
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Creates an index on an existing table.
    pub async fn create_index(&self, table: &str, index: &Index) -> Result<()> {
        let sql = self.create_index_sql(table, index)?;
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Drops an index.
    pub async fn drop_index(&self, table: &str, name: &str) -> Result<()> {
        let sql = self.drop_index_sql(table, name)?;
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Adds a column to an existing table.
    pub async fn add_column(&self, table: &str, column: &Column) -> Result<()> {
        let sql = self.add_column_sql(table, column);
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Drops a column from an existing table.
    pub async fn remove_column(&self, table: &str, column: &str) -> Result<()> {
        let sql = self.remove_column_sql(table, column);
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Reads a full table definition back from the database.
    pub async fn load_table(&self, name: &str) -> Result<Table> {
        let physical = self.physical_name(name);
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(&physical)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(DriverError::NoSuchTable(String::from(name)));
        }

        let mut table = Table::new(name);
        let (columns, primary) = self.read_columns(&physical).await?;
        for column in columns {
            table.add_column(column)?;
        }
        if let Some(primary) = primary {
            table.add_index(primary)?;
        }
        let (indexes, foreign_keys) = self.read_constraints(&physical).await?;
        for index in indexes {
            table.add_index(index)?;
        }
        for fk in foreign_keys {
            table.add_foreign_key(fk)?;
        }
        Ok(table)
    }

    /// Reads the column definitions of a table.
    pub async fn get_columns(&self, name: &str) -> Result<Vec<Column>> {
        let (columns, _) = self.read_columns(&self.physical_name(name)).await?;
        Ok(columns)
    }

    /// Reads the secondary indexes and foreign keys of a table.
    pub async fn get_constraints(&self, name: &str) -> Result<(Vec<Index>, Vec<ForeignKey>)> {
        self.read_constraints(&self.physical_name(name)).await
    }

    async fn read_columns(&self, physical: &str) -> Result<(Vec<Column>, Option<Index>)> {
        let quoted = SqliteDialect.ident_quote(physical);
        let rows = sqlx::query(&format!("PRAGMA table_info({quoted})"))
            .fetch_all(&self.pool)
            .await?;

        let single_column_pk = primary_count(&rows)? == 1;
        let mut columns = Vec::with_capacity(rows.len());
        let mut primary_columns: Vec<(i64, String)> = Vec::new();
        for row in &rows {
            let name: String = row.try_get("name")?;
            let declared: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let default: Option<String> = row.try_get("dflt_value")?;
            let pk: i64 = row.try_get("pk")?;

            let sql_type = SqlType::parse(&declared).unwrap_or_else(|| {
                warn!(column = %name, declared = %declared, "Unknown declared type, assuming TEXT");
                SqlType::Text
            });

            let mut column = Column::new(&name, sql_type.clone());
            if not_null != 0 || pk > 0 {
                column = column.not_null();
            }
            column = column.default(parse_default(default.as_deref()));
            // A lone INTEGER primary key is the rowid alias and behaves as
            // an auto-increment.
            if pk == 1 && single_column_pk && sql_type == SqlType::Integer {
                column = column.serial();
            }
            columns.push(column);
            if pk > 0 {
                primary_columns.push((pk, name));
            }
        }

        primary_columns.sort_by_key(|(pk, _)| *pk);
        let primary = if primary_columns.is_empty() {
            None
        } else {
            Some(Index::primary(
                primary_columns.into_iter().map(|(_, name)| name).collect(),
            )?)
        };
        Ok((columns, primary))
    }

    async fn read_constraints(&self, physical: &str) -> Result<(Vec<Index>, Vec<ForeignKey>)> {
        let quoted = SqliteDialect.ident_quote(physical);

        let mut indexes = Vec::new();
        let index_rows = sqlx::query(&format!("PRAGMA index_list({quoted})"))
            .fetch_all(&self.pool)
            .await?;
        for row in index_rows {
            let name: String = row.try_get("name")?;
            let unique: i64 = row.try_get("unique")?;
            let origin: String = row.try_get("origin")?;
            // The primary key is reported through table_info already.
            if origin == "pk" {
                continue;
            }

            let info_rows = sqlx::query(&format!(
                "PRAGMA index_info({})",
                SqliteDialect.ident_quote(&name)
            ))
            .fetch_all(&self.pool)
            .await?;
            let mut columns: Vec<(i64, String)> = Vec::with_capacity(info_rows.len());
            for info in info_rows {
                let seqno: i64 = info.try_get("seqno")?;
                let column: String = info.try_get("name")?;
                columns.push((seqno, column));
            }
            columns.sort_by_key(|(seqno, _)| *seqno);
            let columns: Vec<String> = columns.into_iter().map(|(_, c)| c).collect();

            let mut index = if unique != 0 {
                Index::unique(columns)?
            } else {
                Index::plain(columns)?
            };
            if name.starts_with("sqlite_autoindex") {
                warn!(index = %name, "Auto-generated index name, using derived name");
            } else {
                index = index.named(name);
            }
            indexes.push(index);
        }

        let fk_rows = sqlx::query(&format!("PRAGMA foreign_key_list({quoted})"))
            .fetch_all(&self.pool)
            .await?;
        let mut grouped: BTreeMap<i64, (String, Vec<(i64, String, String)>, String, String)> =
            BTreeMap::new();
        for row in fk_rows {
            let id: i64 = row.try_get("id")?;
            let seq: i64 = row.try_get("seq")?;
            let referred: String = row.try_get("table")?;
            let from: String = row.try_get("from")?;
            let to: String = row.try_get("to")?;
            let on_update: String = row.try_get("on_update")?;
            let on_delete: String = row.try_get("on_delete")?;

            let entry = grouped
                .entry(id)
                .or_insert_with(|| (referred, Vec::new(), on_update, on_delete));
            entry.1.push((seq, from, to));
        }

        let mut foreign_keys = Vec::with_capacity(grouped.len());
        for (_, (referred, mut pairs, on_update, on_delete)) in grouped {
            pairs.sort_by_key(|(seq, _, _)| *seq);
            let (locals, referreds): (Vec<String>, Vec<String>) =
                pairs.into_iter().map(|(_, from, to)| (from, to)).unzip();
            let referred = self.logical_name(&referred);
            let fk = ForeignKey::new(locals, referred, referreds)?
                .on_update(parse_action(&on_update))
                .on_delete(parse_action(&on_delete));
            foreign_keys.push(fk);
        }

        Ok((indexes, foreign_keys))
    }

    fn logical_name(&self, physical: &str) -> String {
        match physical.strip_prefix(&self.config.table_prefix) {
            Some(stripped) => String::from(stripped),
            None => String::from(physical),
        }
    }
}

fn primary_count(rows: &[SqliteRow]) -> Result<usize> {
    let mut count = 0;
    for row in rows {
        let pk: i64 = row.try_get("pk")?;
        if pk > 0 {
            count += 1;
        }
    }
    Ok(count)
}

fn parse_action(value: &str) -> ForeignKeyAction {
    ForeignKeyAction::parse(value).unwrap_or_else(|| {
        warn!(action = %value, "Unknown referential action, assuming RESTRICT");
        ForeignKeyAction::Restrict
    })
}

fn parse_default(value: Option<&str>) -> DefaultValue {
    let Some(value) = value else {
        return DefaultValue::None;
    };
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("NULL") {
        return DefaultValue::Null;
    }
    if trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'') {
        let inner = &trimmed[1..trimmed.len() - 1];
        return DefaultValue::String(inner.replace("''", "'"));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return DefaultValue::Integer(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        return DefaultValue::Float(float);
    }
    DefaultValue::Expression(String::from(trimmed))
}

/// Binds one value onto a query, matching the stored variant.
fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn row_to_record(row: &SqliteRow) -> Result<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        let i = column.ordinal();
        let type_name = {
            let raw = row.try_get_raw(i)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };
        let value = match type_name.as_deref() {
            None => SqlValue::Null,
            Some("INTEGER") => SqlValue::Int(row.try_get(i)?),
            Some("REAL") => SqlValue::Float(row.try_get(i)?),
            Some("BLOB") => SqlValue::Blob(row.try_get(i)?),
            Some("BOOLEAN") => SqlValue::Bool(row.try_get(i)?),
            Some(_) => SqlValue::Text(row.try_get(i)?),
        };
        record = record.set(column.name(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn driver() -> SqliteDriver {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        SqliteDriver::new(pool)
    }

    #[tokio::test]
    async fn test_serial_column_definition() {
        let d = driver().await;
        let column = Column::new("id", SqlType::Integer).serial();
        assert_eq!(
            d.column_definition(&column),
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"
        );
    }

    #[tokio::test]
    async fn test_create_table_sql_with_serial() {
        let d = driver().await;
        let mut table = Table::new("users");
        table
            .add_column(Column::new("id", SqlType::Integer).serial())
            .unwrap();
        table
            .add_column(Column::new("name", SqlType::Varchar(64)).not_null())
            .unwrap();
        table
            .add_index(Index::primary(vec![String::from("id")]).unwrap())
            .unwrap();

        let sql = d.create_table_sql(&table).unwrap();
        assert_eq!(sql.len(), 1);
        assert_eq!(
            sql[0],
            "CREATE TABLE \"users\" (\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, \
             \"name\" VARCHAR(64) NOT NULL)"
        );
    }

    #[tokio::test]
    async fn test_create_table_rejects_primary_besides_serial() {
        let d = driver().await;
        let mut table = Table::new("things");
        table
            .add_column(Column::new("seq", SqlType::Integer).serial())
            .unwrap();
        table
            .add_column(Column::new("code", SqlType::Varchar(16)).not_null())
            .unwrap();
        table
            .add_index(Index::primary(vec![String::from("code")]).unwrap())
            .unwrap();

        assert!(matches!(
            d.create_table_sql(&table),
            Err(DriverError::Unsupported { dialect: "sqlite", .. })
        ));
    }

    #[tokio::test]
    async fn test_truncate_renders_delete() {
        let d = driver().await;
        assert_eq!(d.truncate_sql("users"), "DELETE FROM \"users\"");
    }

    #[tokio::test]
    async fn test_foreign_key_ddl_unsupported() {
        let d = driver().await;
        let fk = ForeignKey::single("user_id", "users", "id").unwrap();
        assert!(matches!(
            d.create_foreign_key_sql("orders", &fk),
            Err(DriverError::Unsupported { dialect: "sqlite", .. })
        ));
        assert!(matches!(
            d.drop_foreign_key_sql("orders", "orders_user_id_fkey"),
            Err(DriverError::Unsupported { dialect: "sqlite", .. })
        ));
    }

    #[tokio::test]
    async fn test_serial_sql_unsupported() {
        let d = driver().await;
        assert!(d.create_serial_sql("users", "id").is_err());
        assert!(d.drop_serial_sql("users", "id").is_err());
    }

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default(None), DefaultValue::None);
        assert_eq!(parse_default(Some("NULL")), DefaultValue::Null);
        assert_eq!(parse_default(Some("42")), DefaultValue::Integer(42));
        assert_eq!(parse_default(Some("1.5")), DefaultValue::Float(1.5));
        assert_eq!(
            parse_default(Some("'it''s'")),
            DefaultValue::String(String::from("it's"))
        );
        assert_eq!(
            parse_default(Some("CURRENT_TIMESTAMP")),
            DefaultValue::Expression(String::from("CURRENT_TIMESTAMP"))
        );
    }

    #[test]
    fn test_placeholder_syntax() {
        assert_eq!(SqliteDialect.placeholder("col1", 1), ":col1");
    }
}
