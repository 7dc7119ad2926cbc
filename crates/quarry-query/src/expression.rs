//! Expression tree types.
//!
//! An [`Expression`] is a backend-neutral condition or value fragment. Each
//! node renders itself to SQL text via [`Expression::to_sql`], registering
//! bound values in the [`Parameters`] context instead of inlining them.
//! Operator precedence is fixed by the object graph: arity is determined by
//! the node type, never re-derived from text.

use crate::error::{QueryError, Result};
use crate::parameters::Parameters;
use crate::select::Select;
use crate::value::SqlValue;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    NotEq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    LtEq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    GtEq,
    /// LIKE pattern match
    Like,
    /// NOT LIKE pattern match
    NotLike,
}

impl CompareOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }

    /// Parses an operator from its SQL spelling.
    pub fn parse(op: &str) -> Result<Self> {
        match op.trim() {
            "=" | "==" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::LtEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::GtEq),
            s if s.eq_ignore_ascii_case("LIKE") => Ok(Self::Like),
            s if s.eq_ignore_ascii_case("NOT LIKE") => Ok(Self::NotLike),
            other => Err(QueryError::UnknownOperator(String::from(other))),
        }
    }
}

/// Boolean combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// All operands must hold.
    And,
    /// At least one operand must hold.
    Or,
}

impl BoolOp {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A field reference, optionally qualified with a table name.
///
/// When unqualified, the render asks [`Parameters::default_table`] whether a
/// default table is active; identifiers always go through the dialect's
/// quoting, never hand-rolled.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldExpression {
    table: Option<String>,
    name: String,
}

impl FieldExpression {
    /// Creates an unqualified field reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    /// Creates a field reference qualified with an explicit table.
    #[must_use]
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the explicit table qualifier, if any.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Renders the reference as `"field"`, `"table"."field"`, or
    /// `"<default table>"."field"` when the context carries a default table.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        let field = params.dialect().ident_quote(&self.name);
        if let Some(table) = &self.table {
            return Ok(format!("{}.{field}", params.dialect().ident_quote(table)));
        }
        match params.default_table() {
            Some(table) => {
                let prefix = table.reference_sql(params.dialect());
                Ok(format!("{prefix}.{field}"))
            }
            None => Ok(field),
        }
    }
}

/// A node of the SQL fragment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A field reference.
    Field(FieldExpression),

    /// A bound value.
    Value(SqlValue),

    /// A binary comparison.
    Comparison {
        /// The operator.
        op: CompareOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },

    /// An n-ary AND/OR combination.
    Boolean {
        /// The combinator.
        op: BoolOp,
        /// The operands, at least one.
        operands: Vec<Expression>,
    },

    /// Unary negation.
    Not(Box<Expression>),

    /// A function call.
    Function {
        /// Function name, rendered verbatim.
        name: String,
        /// The arguments.
        args: Vec<Expression>,
    },

    /// A complete sub-query, rendered parenthesized.
    SubQuery(Box<Select>),

    /// A raw SQL fragment, rendered verbatim.
    Raw(String),
}

impl Expression {
    /// Creates a field reference expression.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(FieldExpression::new(name))
    }

    /// Creates a bound-value expression.
    #[must_use]
    pub fn value(value: impl Into<SqlValue>) -> Self {
        Self::Value(value.into())
    }

    /// Returns whether this node is the NULL value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(SqlValue::Null))
    }

    /// Creates a comparison expression.
    #[must_use]
    pub fn compare(self, op: CompareOp, right: Self) -> Self {
        Self::Comparison {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    /// Combines with another expression under AND, flattening nested ANDs.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.combine(BoolOp::And, right)
    }

    /// Combines with another expression under OR, flattening nested ORs.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.combine(BoolOp::Or, right)
    }

    /// Negates the expression.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    fn combine(self, op: BoolOp, right: Self) -> Self {
        match self {
            Self::Boolean {
                op: existing,
                mut operands,
            } if existing == op => {
                operands.push(right);
                Self::Boolean { op, operands }
            }
            left => Self::Boolean {
                op,
                operands: vec![left, right],
            },
        }
    }

    /// Renders the node to SQL text, binding values through `params`.
    pub fn to_sql(&self, params: &mut Parameters<'_>) -> Result<String> {
        match self {
            Self::Field(field) => field.to_sql(params),
            Self::Value(SqlValue::Null) => Ok(String::from("NULL")),
            Self::Value(value) => Ok(params.assign(value.clone())),
            Self::Comparison { op, left, right } => {
                if right.is_null() {
                    let lhs = left.to_sql_grouped(params)?;
                    return match op {
                        CompareOp::Eq => Ok(format!("{lhs} IS NULL")),
                        CompareOp::NotEq => Ok(format!("{lhs} IS NOT NULL")),
                        other => Err(QueryError::NullComparison(String::from(other.as_str()))),
                    };
                }
                let lhs = left.to_sql_grouped(params)?;
                let rhs = right.to_sql_grouped(params)?;
                Ok(format!("{lhs} {} {rhs}", op.as_str()))
            }
            Self::Boolean { op, operands } => {
                if operands.is_empty() {
                    return Err(QueryError::EmptyBoolean);
                }
                let parts: Vec<String> = operands
                    .iter()
                    .map(|operand| operand.to_sql_grouped(params))
                    .collect::<Result<_>>()?;
                Ok(parts.join(&format!(" {} ", op.as_str())))
            }
            Self::Not(inner) => Ok(format!("NOT ({})", inner.to_sql(params)?)),
            Self::Function { name, args } => {
                let rendered: Vec<String> = args
                    .iter()
                    .map(|arg| arg.to_sql(params))
                    .collect::<Result<_>>()?;
                Ok(format!("{name}({})", rendered.join(", ")))
            }
            Self::SubQuery(query) => Ok(format!("({})", query.to_sql(params)?)),
            Self::Raw(sql) => Ok(sql.clone()),
        }
    }

    /// Renders with parentheses around boolean combinations, so a composed
    /// graph round-trips with its structure intact.
    fn to_sql_grouped(&self, params: &mut Parameters<'_>) -> Result<String> {
        let sql = self.to_sql(params)?;
        if matches!(self, Self::Boolean { .. }) {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }
}

impl From<FieldExpression> for Expression {
    fn from(field: FieldExpression) -> Self {
        Self::Field(field)
    }
}

impl From<SqlValue> for Expression {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

impl From<Select> for Expression {
    fn from(query: Select) -> Self {
        Self::SubQuery(Box::new(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::TableClause;
    use crate::dialect::AnsiDialect;

    fn fresh(dialect: &AnsiDialect) -> Parameters<'_> {
        Parameters::new(dialect)
    }

    #[test]
    fn test_field_no_table() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let f = FieldExpression::new("foo");
        assert_eq!(f.to_sql(&mut p).unwrap(), "\"foo\"");
        assert!(!Expression::Field(f).is_null());
    }

    #[test]
    fn test_field_default_table() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        p.set_default_table(Some(TableClause::new("PLACEHOLDER")));
        let f = FieldExpression::new("foo");
        assert_eq!(f.to_sql(&mut p).unwrap(), "\"PLACEHOLDER\".\"foo\"");
    }

    #[test]
    fn test_field_explicit_table_wins() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        p.set_default_table(Some(TableClause::new("other")));
        let f = FieldExpression::qualified("t", "foo");
        assert_eq!(f.to_sql(&mut p).unwrap(), "\"t\".\"foo\"");
    }

    #[test]
    fn test_comparison_binds_value() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let e = Expression::field("a").compare(CompareOp::Eq, Expression::Value(SqlValue::Int(5)));
        assert_eq!(e.to_sql(&mut p).unwrap(), "\"a\" = :col1");
        assert_eq!(p.get("col1"), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn test_null_comparison_rewrites() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let eq = Expression::field("a").compare(CompareOp::Eq, Expression::Value(SqlValue::Null));
        assert_eq!(eq.to_sql(&mut p).unwrap(), "\"a\" IS NULL");

        let ne = Expression::field("a").compare(CompareOp::NotEq, Expression::Value(SqlValue::Null));
        assert_eq!(ne.to_sql(&mut p).unwrap(), "\"a\" IS NOT NULL");
        assert!(p.is_empty());
    }

    #[test]
    fn test_null_comparison_with_other_operator_fails() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let e = Expression::field("a").compare(CompareOp::Lt, Expression::Value(SqlValue::Null));
        assert_eq!(
            e.to_sql(&mut p),
            Err(QueryError::NullComparison(String::from("<")))
        );
    }

    #[test]
    fn test_boolean_grouping() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let inner = Expression::field("a")
            .compare(CompareOp::Eq, Expression::Value(SqlValue::Int(1)))
            .and(Expression::field("b").compare(CompareOp::Eq, Expression::Value(SqlValue::Int(2))));
        let e = inner.or(Expression::field("c").compare(CompareOp::Eq, Expression::Value(SqlValue::Int(3))));
        assert_eq!(
            e.to_sql(&mut p).unwrap(),
            "(\"a\" = :col1 AND \"b\" = :col2) OR \"c\" = :col3"
        );
    }

    #[test]
    fn test_and_flattens() {
        let e = Expression::field("a")
            .and(Expression::field("b"))
            .and(Expression::field("c"));
        match e {
            Expression::Boolean { op, operands } => {
                assert_eq!(op, BoolOp::And);
                assert_eq!(operands.len(), 3);
            }
            other => panic!("expected Boolean, got {other:?}"),
        }
    }

    #[test]
    fn test_not_parenthesizes() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let e = Expression::field("a")
            .compare(CompareOp::Eq, Expression::Value(SqlValue::Bool(true)))
            .not();
        assert_eq!(e.to_sql(&mut p).unwrap(), "NOT (\"a\" = :col1)");
    }

    #[test]
    fn test_function_call() {
        let d = AnsiDialect;
        let mut p = fresh(&d);
        let e = Expression::Function {
            name: String::from("COALESCE"),
            args: vec![Expression::field("a"), Expression::Value(SqlValue::Int(0))],
        };
        assert_eq!(e.to_sql(&mut p).unwrap(), "COALESCE(\"a\", :col1)");
    }

    #[test]
    fn test_rendering_twice_restarts_numbering() {
        let d = AnsiDialect;
        let e = Expression::field("a").compare(CompareOp::Eq, Expression::Value(SqlValue::Int(9)));
        let mut p1 = fresh(&d);
        let mut p2 = fresh(&d);
        assert_eq!(e.to_sql(&mut p1).unwrap(), "\"a\" = :col1");
        assert_eq!(e.to_sql(&mut p2).unwrap(), "\"a\" = :col1");
    }

    #[test]
    fn test_compare_op_parse() {
        assert_eq!(CompareOp::parse("=").unwrap(), CompareOp::Eq);
        assert_eq!(CompareOp::parse("<>").unwrap(), CompareOp::NotEq);
        assert_eq!(CompareOp::parse("like").unwrap(), CompareOp::Like);
        assert!(matches!(
            CompareOp::parse("~~"),
            Err(QueryError::UnknownOperator(_))
        ));
    }
}
