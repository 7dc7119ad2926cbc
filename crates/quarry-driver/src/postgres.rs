//! PostgreSQL backend.
//!
//! Placeholders are positional (`$1`, `$2`, ...). Serial columns render as
//! the SERIAL pseudo-types at creation and can also be retrofitted onto an
//! existing column through an owned sequence. Introspection reads
//! `information_schema`.

use std::collections::BTreeMap;

use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column as _, Row, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use quarry_query::{Dialect, Parameters, SqlValue};
use quarry_schema::{
    Column, DefaultValue, ForeignKey, ForeignKeyAction, Index, IndexType, SqlType, Table,
};

use crate::condition::{OrderSpec, WhereSpec};
use crate::config::DriverConfig;
use crate::driver::{bind_order, Driver};
use crate::error::{DriverError, Result};
use crate::record::Record;

/// PostgreSQL rendering rules: double-quoted identifiers, `$N` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl Dialect for PgDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, _name: &str, position: usize) -> String {
        format!("${position}")
    }
}

/// Driver over a `sqlx` PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresDriver {
    pool: PgPool,
    config: DriverConfig,
}

impl Driver for PostgresDriver {
    fn dialect(&self) -> &dyn Dialect {
        &PgDialect
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
            SqlType::DateTime => String::from("TIMESTAMP"),
            SqlType::Date => String::from("DATE"),
            SqlType::Real => String::from("REAL"),
            SqlType::Double => String::from("DOUBLE PRECISION"),
            SqlType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            SqlType::Blob => String::from("BYTEA"),
        }
    }

    fn column_definition(&self, column: &Column) -> String {
        if column.is_serial() {
            let serial_type = match column.sql_type() {
                SqlType::BigInt => "BIGSERIAL",
                SqlType::SmallInt => "SMALLSERIAL",
                _ => "SERIAL",
            };
            return format!(
                "{} {} NOT NULL",
                self.ident_quote(column.name()),
                serial_type
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
        // PostgreSQL rejects integer literals for BOOLEAN defaults.
        let default = match column.default_value() {
            DefaultValue::Bool(b) => Some(String::from(if *b { "TRUE" } else { "FALSE" })),
            other => other.to_sql(),
        };
        if let Some(default) = default {
            def.push_str(" DEFAULT ");
            def.push_str(&default);
        }
        def
    }

    fn create_serial_sql(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let sequence = self.sequence_name(table, column);
        let quoted_sequence = self.ident_quote(&sequence);
        Ok(vec![
            format!("CREATE SEQUENCE {quoted_sequence}"),
            format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT nextval('{sequence}')",
                self.table_name(table),
                self.ident_quote(column)
            ),
            format!(
                "ALTER SEQUENCE {quoted_sequence} OWNED BY {}.{}",
                self.table_name(table),
                self.ident_quote(column)
            ),
        ])
    }

    fn drop_serial_sql(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let sequence = self.sequence_name(table, column);
        Ok(vec![
            format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                self.table_name(table),
                self.ident_quote(column)
            ),
            format!("DROP SEQUENCE IF EXISTS {}", self.ident_quote(&sequence)),
        ])
    }
}

impl PostgresDriver {
    /// Creates a driver with default configuration.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, DriverConfig::default())
    }

    /// Creates a driver with explicit configuration.
    #[must_use]
    pub fn with_config(pool: PgPool, config: DriverConfig) -> Self {
        Self { pool, config }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn physical_name(&self, table: &str) -> String {
        format!("{}{}", self.config.table_prefix, table)
    }

    fn sequence_name(&self, table: &str, column: &str) -> String {
        format!("{}_{column}_seq", self.physical_name(table))
    }

    async fn run(&self, sql: &str, values: Vec<SqlValue>) -> Result<sqlx::postgres::PgQueryResult> {
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

    /// Inserts a record, returning rows affected.
    pub async fn insert(&self, table: &str, record: &Record) -> Result<u64> {
        let mut params = Parameters::new(&PgDialect);
        let sql = self.insert_sql(table, record, &mut params);
        Ok(self.run(&sql, bind_order(params)).await?.rows_affected())
    }

    /// Inserts a record and returns the value of `returning` for the new
    /// row, typically the serial key.
    pub async fn insert_returning(
        &self,
        table: &str,
        record: &Record,
        returning: &str,
    ) -> Result<i64> {
        let mut params = Parameters::new(&PgDialect);
        let sql = format!(
            "{} RETURNING {}",
            self.insert_sql(table, record, &mut params),
            self.ident_quote(returning)
        );
        debug!(sql = %sql, "Executing SQL");
        let mut query = sqlx::query(&sql);
        for value in bind_order(params) {
            query = bind_value(query, value);
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get(0)?)
    }

    /// Selects matching rows as records.
    pub async fn select(
        &self,
        table: &str,
        fields: &[&str],
        condition: Option<&WhereSpec>,
        order: Option<&OrderSpec>,
    ) -> Result<Vec<Record>> {
        let mut params = Parameters::new(&PgDialect);
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
        let mut params = Parameters::new(&PgDialect);
        let sql = self.update_sql(table, record, condition, &mut params)?;
        self.execute(&sql, bind_order(params)).await
    }

    /// Deletes matching rows, returning the number affected.
    pub async fn delete(&self, table: &str, condition: Option<&WhereSpec>) -> Result<u64> {
        let mut params = Parameters::new(&PgDialect);
        let sql = self.delete_sql(table, condition, &mut params)?;
        self.execute(&sql, bind_order(params)).await
    }

    /// Removes all rows from a table.
    pub async fn truncate(&self, table: &str) -> Result<()> {
        let sql = self.truncate_sql(table);
        self.run(&sql, Vec::new()).await?;
        Ok(())
    }

    /// Inserts or updates on conflict, returning rows affected.
    pub async fn upsert(
        &self,
        table: &str,
        record: &Record,
        conflict_columns: &[&str],
    ) -> Result<u64> {
        let mut params = Parameters::new(&PgDialect);
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

    /// Adds a foreign key constraint to an existing table.
    pub async fn create_foreign_key(&self, table: &str, fk: &ForeignKey) -> Result<()> {
        let sql = self.create_foreign_key_sql(table, fk)?;
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Drops a foreign key constraint.
    pub async fn drop_foreign_key(&self, table: &str, name: &str) -> Result<()> {
        let sql = self.drop_foreign_key_sql(table, name)?;
        info!(sql = %sql, "Applying DDL");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Makes an existing column auto-increment through an owned sequence.
    pub async fn create_serial(&self, table: &str, column: &str) -> Result<()> {
        for sql in self.create_serial_sql(table, column)? {
            info!(sql = %sql, "Applying DDL");
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Removes the auto-increment from a column.
    pub async fn drop_serial(&self, table: &str, column: &str) -> Result<()> {
        for sql in self.drop_serial_sql(table, column)? {
            info!(sql = %sql, "Applying DDL");
            sqlx::query(&sql).execute(&self.pool).await?;
        }
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
        let exists: Option<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = $1",
        )
        .bind(&physical)
        .fetch_optional(&self.pool)
        .await?;
        if exists.is_none() {
            return Err(DriverError::NoSuchTable(String::from(name)));
        }

        let mut table = Table::new(name);
        for column in self.read_columns(&physical).await? {
            table.add_column(column)?;
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
        self.read_columns(&self.physical_name(name)).await
    }

    /// Reads the key constraints of a table: the primary and unique indexes
    /// and the foreign keys.
    pub async fn get_constraints(&self, name: &str) -> Result<(Vec<Index>, Vec<ForeignKey>)> {
        self.read_constraints(&self.physical_name(name)).await
    }

    async fn read_columns(&self, physical: &str) -> Result<Vec<Column>> {
        let rows = sqlx::query(
            "SELECT column_name, data_type, character_maximum_length, \
                    numeric_precision, numeric_scale, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(physical)
        .fetch_all(&self.pool)
        .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("column_name")?;
            let data_type: String = row.try_get("data_type")?;
            let max_length: Option<i32> = row.try_get("character_maximum_length")?;
            let precision: Option<i32> = row.try_get("numeric_precision")?;
            let scale: Option<i32> = row.try_get("numeric_scale")?;
            let is_nullable: String = row.try_get("is_nullable")?;
            let default: Option<String> = row.try_get("column_default")?;

            let declared = rebuild_type(&data_type, max_length, precision, scale);
            let sql_type = SqlType::parse(&declared).unwrap_or_else(|| {
                warn!(column = %name, declared = %declared, "Unknown declared type, assuming TEXT");
                SqlType::Text
            });
            let serial = default
                .as_deref()
                .is_some_and(|d| d.starts_with("nextval("));

            let mut column = Column::new(&name, sql_type);
            if is_nullable == "NO" {
                column = column.not_null();
            }
            if serial {
                column = column.serial();
            } else {
                column = column.default(parse_default(default.as_deref()));
            }
            columns.push(column);
        }
        Ok(columns)
    }

    async fn read_constraints(&self, physical: &str) -> Result<(Vec<Index>, Vec<ForeignKey>)> {
        let key_rows = sqlx::query(
            "SELECT tc.constraint_name, tc.constraint_type, kcu.column_name \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON kcu.constraint_name = tc.constraint_name \
              AND kcu.table_schema = tc.table_schema \
             WHERE tc.table_schema = 'public' AND tc.table_name = $1 \
               AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE') \
             ORDER BY kcu.ordinal_position",
        )
        .bind(physical)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<String, (IndexType, Vec<String>)> = BTreeMap::new();
        for row in key_rows {
            let name: String = row.try_get("constraint_name")?;
            let kind: String = row.try_get("constraint_type")?;
            let column: String = row.try_get("column_name")?;
            let index_type = if kind == "PRIMARY KEY" {
                IndexType::Primary
            } else {
                IndexType::Unique
            };
            grouped
                .entry(name)
                .or_insert_with(|| (index_type, Vec::new()))
                .1
                .push(column);
        }

        let mut indexes = Vec::with_capacity(grouped.len());
        for (name, (index_type, columns)) in grouped {
            let index = match index_type {
                IndexType::Primary => Index::primary(columns)?,
                _ => Index::unique(columns)?.named(name),
            };
            indexes.push(index);
        }

        // The referred side comes from a second key_column_usage lookup on
        // the unique constraint, matched by position so composite keys pair
        // column for column.
        let fk_rows = sqlx::query(
            "SELECT tc.constraint_name, kcu.column_name, \
                    rcu.table_name AS referred_table, rcu.column_name AS referred_column, \
                    rc.update_rule, rc.delete_rule \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON kcu.constraint_name = tc.constraint_name \
              AND kcu.constraint_schema = tc.constraint_schema \
             JOIN information_schema.referential_constraints rc \
               ON rc.constraint_name = tc.constraint_name \
              AND rc.constraint_schema = tc.constraint_schema \
             JOIN information_schema.key_column_usage rcu \
               ON rcu.constraint_name = rc.unique_constraint_name \
              AND rcu.constraint_schema = rc.unique_constraint_schema \
              AND rcu.ordinal_position = kcu.position_in_unique_constraint \
             WHERE tc.table_schema = 'public' AND tc.table_name = $1 \
               AND tc.constraint_type = 'FOREIGN KEY' \
             ORDER BY kcu.ordinal_position",
        )
        .bind(physical)
        .fetch_all(&self.pool)
        .await?;

        let mut pairs = Vec::with_capacity(fk_rows.len());
        for row in fk_rows {
            pairs.push(ForeignKeyRow {
                constraint: row.try_get("constraint_name")?,
                column: row.try_get("column_name")?,
                referred_table: row.try_get("referred_table")?,
                referred_column: row.try_get("referred_column")?,
                update_rule: row.try_get("update_rule")?,
                delete_rule: row.try_get("delete_rule")?,
            });
        }

        Ok((indexes, self.fold_foreign_keys(pairs)?))
    }

    /// Groups one-row-per-column-pair results into foreign keys, keeping
    /// the positional order of the pairs within each constraint.
    fn fold_foreign_keys(&self, rows: Vec<ForeignKeyRow>) -> Result<Vec<ForeignKey>> {
        let mut grouped: BTreeMap<String, (String, Vec<(String, String)>, String, String)> =
            BTreeMap::new();
        for row in rows {
            let ForeignKeyRow {
                constraint,
                column,
                referred_table,
                referred_column,
                update_rule,
                delete_rule,
            } = row;
            grouped
                .entry(constraint)
                .or_insert_with(|| (referred_table, Vec::new(), update_rule, delete_rule))
                .1
                .push((column, referred_column));
        }

        let mut foreign_keys = Vec::with_capacity(grouped.len());
        for (name, (referred_table, pairs, update_rule, delete_rule)) in grouped {
            let (locals, referreds): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
            let referred_table = self.logical_name(&referred_table);
            let fk = ForeignKey::new(locals, referred_table, referreds)?
                .named(name)
                .on_update(parse_action(&update_rule))
                .on_delete(parse_action(&delete_rule));
            foreign_keys.push(fk);
        }
        Ok(foreign_keys)
    }

    fn logical_name(&self, physical: &str) -> String {
        match physical.strip_prefix(&self.config.table_prefix) {
            Some(stripped) => String::from(stripped),
            None => String::from(physical),
        }
    }
}

/// One referencing/referred column pair of a foreign key constraint.
struct ForeignKeyRow {
    constraint: String,
    column: String,
    referred_table: String,
    referred_column: String,
    update_rule: String,
    delete_rule: String,
}

fn rebuild_type(
    data_type: &str,
    max_length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    match (data_type, max_length, precision, scale) {
        ("character varying" | "character", Some(n), _, _) => format!("{data_type}({n})"),
        ("numeric", _, Some(p), Some(s)) => format!("numeric({p}, {s})"),
        _ => String::from(data_type),
    }
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
    // information_schema reports defaults with a cast suffix, e.g.
    // 'active'::text.
    let trimmed = match value.find("::") {
        Some(cast) => value[..cast].trim(),
        None => value.trim(),
    };
    if trimmed.eq_ignore_ascii_case("NULL") {
        return DefaultValue::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return DefaultValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return DefaultValue::Bool(false);
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
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: SqlValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

fn row_to_record(row: &PgRow) -> Result<Record> {
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
            Some("INT2") => SqlValue::Int(i64::from(row.try_get::<i16, _>(i)?)),
            Some("INT4") => SqlValue::Int(i64::from(row.try_get::<i32, _>(i)?)),
            Some("INT8") => SqlValue::Int(row.try_get(i)?),
            Some("FLOAT4") => SqlValue::Float(f64::from(row.try_get::<f32, _>(i)?)),
            Some("FLOAT8") => SqlValue::Float(row.try_get(i)?),
            Some("BOOL") => SqlValue::Bool(row.try_get(i)?),
            Some("BYTEA") => SqlValue::Blob(row.try_get(i)?),
            Some(_) => SqlValue::Text(row.try_get(i)?),
        };
        record = record.set(column.name(), value);
    }
    Ok(record)
}
