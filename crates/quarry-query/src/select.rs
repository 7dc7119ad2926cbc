//! SELECT query object.

use crate::clause::{
    HavingClause, JoinClause, JoinType, OrderClause, TableClause, UnionClause, WhereClause,
};
use crate::error::Result;
use crate::expression::{Expression, FieldExpression};
use crate::parameters::Parameters;

/// One projected column: an expression with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectField {
    expr: Expression,
    alias: Option<String>,
}

impl SelectField {
    /// Creates an unaliased projection.
    #[must_use]
    pub fn new(expr: impl Into<Expression>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    /// Creates an aliased projection.
    #[must_use]
    pub fn aliased(expr: impl Into<Expression>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.into()),
        }
    }

    fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        let sql = self.expr.to_sql(params)?;
        match &self.alias {
            Some(alias) => Ok(format!("{sql} AS {}", params.dialect().ident_quote(alias))),
            None => Ok(sql),
        }
    }
}

/// A complete SELECT query, assembled from clauses.
///
/// Methods consume and return the query, composing values rather than
/// mutating shared state; a built query can be reused as a sub-query inside
/// a UNION or a condition. Nothing renders until a driver (or
/// [`Select::to_sql`]) walks the tree with a [`Parameters`] context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    table: Option<TableClause>,
    fields: Vec<SelectField>,
    joins: Vec<JoinClause>,
    condition: Option<WhereClause>,
    group_by: Vec<FieldExpression>,
    having: Option<HavingClause>,
    order: Vec<OrderClause>,
    limit: Option<u64>,
    offset: Option<u64>,
    unions: Vec<UnionClause>,
}

impl Select {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the FROM table.
    #[must_use]
    pub fn from(mut self, table: impl Into<TableClause>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Adds a projected column.
    #[must_use]
    pub fn field(mut self, field: SelectField) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds projected columns by name. An empty projection renders `*`.
    #[must_use]
    pub fn fields(mut self, names: &[&str]) -> Self {
        self.fields.extend(
            names
                .iter()
                .map(|name| SelectField::new(FieldExpression::new(*name))),
        );
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, join: JoinClause) -> Self {
        self.joins.push(join);
        self
    }

    /// Adds an INNER JOIN.
    #[must_use]
    pub fn inner_join(self, table: impl Into<TableClause>, on: Expression) -> Self {
        self.join(JoinClause::new(JoinType::Inner, table, on))
    }

    /// Adds a LEFT JOIN.
    #[must_use]
    pub fn left_join(self, table: impl Into<TableClause>, on: Expression) -> Self {
        self.join(JoinClause::new(JoinType::Left, table, on))
    }

    /// Sets the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, clause: WhereClause) -> Self {
        self.condition = Some(clause);
        self
    }

    /// Adds GROUP BY fields.
    #[must_use]
    pub fn group_by(mut self, names: &[&str]) -> Self {
        self.group_by
            .extend(names.iter().map(|name| FieldExpression::new(*name)));
        self
    }

    /// Sets the HAVING clause.
    #[must_use]
    pub fn having(mut self, clause: HavingClause) -> Self {
        self.having = Some(clause);
        self
    }

    /// Adds an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, order: OrderClause) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the LIMIT.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Sets the OFFSET.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Appends a UNION clause.
    #[must_use]
    pub fn union(mut self, union: UnionClause) -> Self {
        self.unions.push(union);
        self
    }

    /// Returns the FROM table.
    #[must_use]
    pub fn table(&self) -> Option<&TableClause> {
        self.table.as_ref()
    }

    /// Returns the WHERE clause.
    #[must_use]
    pub fn condition(&self) -> Option<&WhereClause> {
        self.condition.as_ref()
    }

    /// Renders the full statement.
    ///
    /// The FROM table becomes the default table for unqualified fields only
    /// when joins are present; the previous default is restored afterwards so
    /// enclosing renders are unaffected.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        let previous = if !self.joins.is_empty() {
            params.set_default_table(self.table.clone())
        } else {
            params.set_default_table(None)
        };
        let result = self.render(params);
        params.set_default_table(previous);
        result
    }

    fn render(&self, params: &mut Parameters<'_>) -> Result<String> {
        let fields = if self.fields.is_empty() {
            String::from("*")
        } else {
            let rendered: Vec<String> = self
                .fields
                .iter()
                .map(|f| f.to_sql(params))
                .collect::<Result<_>>()?;
            rendered.join(", ")
        };

        let mut sql = format!("SELECT {fields}");

        if let Some(table) = &self.table {
            sql.push_str(" FROM ");
            sql.push_str(&table.to_sql(params.dialect()));
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql(params)?);
        }

        if let Some(clause) = &self.condition {
            sql.push_str(" WHERE ");
            sql.push_str(&clause.to_sql(params)?);
        }

        if !self.group_by.is_empty() {
            let rendered: Vec<String> = self
                .group_by
                .iter()
                .map(|f| f.to_sql(params))
                .collect::<Result<_>>()?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&rendered.join(", "));
        }

        if let Some(clause) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&clause.to_sql(params)?);
        }

        if !self.order.is_empty() {
            let rendered: Vec<String> = self
                .order
                .iter()
                .map(|o| o.to_sql(params))
                .collect::<Result<_>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&rendered.join(", "));
        }

        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        if let Some(n) = self.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        // Unions render outside the default-table scope of this query; each
        // sub-query installs and restores its own.
        for union in &self.unions {
            sql.push(' ');
            sql.push_str(&union.to_sql(params)?);
        }

        Ok(sql)
    }
}
