//! Clause types composing a query.

use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::expression::{Expression, FieldExpression};
use crate::parameters::Parameters;
use crate::select::Select;

/// A table reference with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableClause {
    name: String,
    alias: Option<String>,
}

impl TableClause {
    /// Creates a table reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Creates an aliased table reference.
    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alias, if set.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Renders the reference as it appears in a FROM clause.
    #[must_use]
    pub fn to_sql(&self, dialect: &dyn Dialect) -> String {
        let name = dialect.ident_quote(&self.name);
        match &self.alias {
            Some(alias) => format!("{name} AS {}", dialect.ident_quote(alias)),
            None => name,
        }
    }

    /// Renders the name used to qualify field references: the alias when one
    /// is set, the table name otherwise.
    #[must_use]
    pub fn reference_sql(&self, dialect: &dyn Dialect) -> String {
        match &self.alias {
            Some(alias) => dialect.ident_quote(alias),
            None => dialect.ident_quote(&self.name),
        }
    }
}

impl From<&str> for TableClause {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableClause {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// An accepted condition shape: a raw SQL string or an expression tree.
///
/// Every clause that takes a condition normalizes through
/// [`Condition::into_expression`], so WHERE and HAVING share one grammar and
/// differ only in keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A raw SQL fragment.
    Raw(String),
    /// An already-built expression.
    Expression(Expression),
}

impl Condition {
    /// Converts to the canonical expression form.
    ///
    /// `clause` names the consuming clause in the error when the condition
    /// is empty.
    pub fn into_expression(self, clause: &'static str) -> Result<Expression> {
        match self {
            Self::Raw(sql) => {
                if sql.trim().is_empty() {
                    Err(QueryError::MissingCondition(clause))
                } else {
                    Ok(Expression::Raw(sql))
                }
            }
            Self::Expression(expr) => Ok(expr),
        }
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<Expression> for Condition {
    fn from(expr: Expression) -> Self {
        Self::Expression(expr)
    }
}

impl From<FieldExpression> for Condition {
    fn from(field: FieldExpression) -> Self {
        Self::Expression(Expression::Field(field))
    }
}

/// A WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    condition: Expression,
}

impl WhereClause {
    /// Creates a WHERE clause, rejecting empty conditions.
    pub fn new(condition: impl Into<Condition>) -> Result<Self> {
        Ok(Self {
            condition: condition.into().into_expression("WHERE")?,
        })
    }

    /// Returns the condition.
    #[must_use]
    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    /// Renders the condition (without the WHERE keyword).
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        self.condition.to_sql(params)
    }
}

/// A HAVING clause.
///
/// Same grammar as WHERE, different keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct HavingClause {
    condition: Expression,
}

impl HavingClause {
    /// Creates a HAVING clause, rejecting empty conditions.
    pub fn new(condition: impl Into<Condition>) -> Result<Self> {
        Ok(Self {
            condition: condition.into().into_expression("HAVING")?,
        })
    }

    /// Returns the condition.
    #[must_use]
    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    /// Renders the condition (without the HAVING keyword).
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        self.condition.to_sql(params)
    }
}

/// Sort direction for an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Parses a direction, case-insensitively.
    pub fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("ASC") || value.eq_ignore_ascii_case("ASCENDING") {
            Ok(Self::Ascending)
        } else if value.eq_ignore_ascii_case("DESC") || value.eq_ignore_ascii_case("DESCENDING") {
            Ok(Self::Descending)
        } else {
            Err(QueryError::UnknownOperator(String::from(value)))
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    field: Expression,
    direction: Direction,
}

impl OrderClause {
    /// Creates an ascending order term.
    #[must_use]
    pub fn ascending(field: impl Into<Expression>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Creates a descending order term.
    #[must_use]
    pub fn descending(field: impl Into<Expression>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Renders `field ASC` / `field DESC`.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        Ok(format!(
            "{} {}",
            self.field.to_sql(params)?,
            self.direction.as_str()
        ))
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
}

impl JoinType {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// A JOIN clause: a table joined under a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    join_type: JoinType,
    table: TableClause,
    condition: Expression,
}

impl JoinClause {
    /// Creates a join.
    #[must_use]
    pub fn new(join_type: JoinType, table: impl Into<TableClause>, condition: Expression) -> Self {
        Self {
            join_type,
            table: table.into(),
            condition,
        }
    }

    /// Returns the joined table.
    #[must_use]
    pub fn table(&self) -> &TableClause {
        &self.table
    }

    /// Renders `<KIND> JOIN "table" ON <condition>`.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        Ok(format!(
            "{} {} ON {}",
            self.join_type.as_str(),
            self.table.to_sql(params.dialect()),
            self.condition.to_sql(params)?
        ))
    }
}

/// UNION kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionType {
    /// Keep duplicate rows.
    All,
    /// Deduplicate rows (the SQL default).
    Distinct,
}

impl UnionType {
    /// Parses a union type tag, case-insensitively. The empty string means
    /// DISTINCT; anything other than ALL/DISTINCT is rejected.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("DISTINCT") {
            Ok(Self::Distinct)
        } else if trimmed.eq_ignore_ascii_case("ALL") {
            Ok(Self::All)
        } else {
            Err(QueryError::InvalidUnionType(String::from(value)))
        }
    }

    /// Returns the canonical tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Distinct => "DISTINCT",
        }
    }
}

/// A UNION of the enclosing query with another complete query.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionClause {
    union_type: UnionType,
    query: Select,
}

impl UnionClause {
    /// Creates a union from a type tag. An empty tag defaults to DISTINCT.
    pub fn new(union_type: &str, query: Select) -> Result<Self> {
        Ok(Self {
            union_type: UnionType::parse(union_type)?,
            query,
        })
    }

    /// Creates a UNION ALL.
    #[must_use]
    pub fn all(query: Select) -> Self {
        Self {
            union_type: UnionType::All,
            query,
        }
    }

    /// Creates a UNION (DISTINCT).
    #[must_use]
    pub fn distinct(query: Select) -> Self {
        Self {
            union_type: UnionType::Distinct,
            query,
        }
    }

    /// Returns the union type.
    #[must_use]
    pub fn union_type(&self) -> UnionType {
        self.union_type
    }

    /// Returns the unioned query.
    #[must_use]
    pub fn query(&self) -> &Select {
        &self.query
    }

    /// Renders `UNION [ALL] (<sub-query>)`.
    ///
    /// DISTINCT renders as the bare keyword: it is the SQL default and the
    /// explicit spelling is not accepted everywhere.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        let keyword = match self.union_type {
            UnionType::All => "UNION ALL",
            UnionType::Distinct => "UNION",
        };
        Ok(format!("{keyword} ({})", self.query.to_sql(params)?))
    }
}
