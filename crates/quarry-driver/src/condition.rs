//! Condition and ordering inputs for the CRUD helpers.
//!
//! These are the loose shapes callers hand to `select`, `update`, and
//! `delete`: a raw SQL fragment, a list of column matches combined with
//! AND, or a full expression tree. Normalization into SQL happens in one
//! place, [`crate::Driver::get_where`].

use quarry_query::{Expression, SqlValue, ToSqlValue};

/// How a single column is matched in a [`WhereSpec::Fields`] list.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldMatch {
    /// Equality against a value; NULL turns into IS NULL.
    Value(SqlValue),
    /// An explicit comparison operator and value.
    Op(String, SqlValue),
}

impl FieldMatch {
    /// Matches the column for equality with `value`.
    #[must_use]
    pub fn value(value: impl ToSqlValue) -> Self {
        Self::Value(value.to_sql_value())
    }

    /// Matches the column with an explicit operator.
    #[must_use]
    pub fn op(operator: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self::Op(operator.into(), value.to_sql_value())
    }
}

/// A WHERE condition in one of the accepted shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereSpec {
    /// Verbatim SQL fragment, spliced in as-is.
    Raw(String),
    /// Column matches, combined with AND.
    Fields(Vec<(String, FieldMatch)>),
    /// A composed expression tree.
    Expression(Expression),
}

impl WhereSpec {
    /// Creates a raw condition.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Creates an empty field-match list; chain [`WhereSpec::field`].
    #[must_use]
    pub fn fields() -> Self {
        Self::Fields(Vec::new())
    }

    /// Appends a column match. No-op on the non-field variants.
    #[must_use]
    pub fn field(mut self, column: impl Into<String>, matcher: FieldMatch) -> Self {
        if let Self::Fields(fields) = &mut self {
            fields.push((column.into(), matcher));
        }
        self
    }
}

impl From<Expression> for WhereSpec {
    fn from(expr: Expression) -> Self {
        Self::Expression(expr)
    }
}

impl From<&str> for WhereSpec {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

/// One column in an [`OrderSpec::Columns`] list.
///
/// The direction is kept as the caller's string and validated when the
/// ORDER BY clause is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// Column name.
    pub column: String,
    /// Direction keyword, ASC or DESC in any case.
    pub direction: String,
}

impl OrderTerm {
    /// Creates an ascending order term.
    #[must_use]
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: String::from("ASC"),
        }
    }

    /// Creates a descending order term.
    #[must_use]
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: String::from("DESC"),
        }
    }

    /// Creates a term with a caller-supplied direction keyword.
    #[must_use]
    pub fn new(column: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: direction.into(),
        }
    }
}

/// An ORDER BY specification: raw fragment or explicit terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Verbatim fragment following the ORDER BY keyword.
    Raw(String),
    /// Explicit column/direction terms.
    Columns(Vec<OrderTerm>),
}

impl OrderSpec {
    /// Creates a raw ordering fragment.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Creates an ordering from explicit terms.
    #[must_use]
    pub fn columns(terms: Vec<OrderTerm>) -> Self {
        Self::Columns(terms)
    }
}
