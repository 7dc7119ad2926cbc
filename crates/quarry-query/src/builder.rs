//! Query builder facade.
//!
//! `Q` collects the factory functions used to assemble queries without
//! constructing AST nodes by hand. Each factory validates its own arguments
//! and returns an immutable node; nodes compose by nesting, so a partially
//! built query is safe to reuse as a sub-query. Building is side-effect free
//! until a driver renders the tree.
//!
//! ```
//! use quarry_query::{AnsiDialect, Parameters, Q};
//!
//! let query = Q::select()
//!     .fields(&["id", "name"])
//!     .from("users")
//!     .where_clause(Q::where_clause(Q::equals("active", true)).unwrap());
//!
//! let dialect = AnsiDialect;
//! let mut params = Parameters::new(&dialect);
//! let sql = query.to_sql(&mut params).unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT \"id\", \"name\" FROM \"users\" WHERE \"active\" = :col1"
//! );
//! ```

use crate::clause::{
    Condition, HavingClause, OrderClause, TableClause, UnionClause, WhereClause,
};
use crate::error::{QueryError, Result};
use crate::expression::{BoolOp, CompareOp, Expression, FieldExpression};
use crate::select::Select;
use crate::value::{SqlValue, ToSqlValue};

/// Conversion used in field position: bare strings become field references.
pub trait IntoField {
    /// Converts to a field-position expression.
    fn into_field(self) -> Expression;
}

impl IntoField for &str {
    fn into_field(self) -> Expression {
        Expression::Field(FieldExpression::new(self))
    }
}

impl IntoField for String {
    fn into_field(self) -> Expression {
        Expression::Field(FieldExpression::new(self))
    }
}

impl IntoField for FieldExpression {
    fn into_field(self) -> Expression {
        Expression::Field(self)
    }
}

impl IntoField for Expression {
    fn into_field(self) -> Expression {
        self
    }
}

/// Conversion used in value position: bare strings become bound values.
pub trait IntoOperand {
    /// Converts to a value-position expression.
    fn into_operand(self) -> Expression;
}

impl IntoOperand for Expression {
    fn into_operand(self) -> Expression {
        self
    }
}

impl IntoOperand for FieldExpression {
    fn into_operand(self) -> Expression {
        Expression::Field(self)
    }
}

impl IntoOperand for Select {
    fn into_operand(self) -> Expression {
        Expression::SubQuery(Box::new(self))
    }
}

macro_rules! operand_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoOperand for $ty {
                fn into_operand(self) -> Expression {
                    Expression::Value(self.to_sql_value())
                }
            }
        )+
    };
}

operand_from_value!(
    SqlValue, bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, &str, String
);

impl<T> IntoOperand for Option<T>
where
    T: ToSqlValue,
{
    fn into_operand(self) -> Expression {
        Expression::Value(self.to_sql_value())
    }
}

/// The builder facade.
pub struct Q;

impl Q {
    /// Starts an empty SELECT query.
    #[must_use]
    pub fn select() -> Select {
        Select::new()
    }

    /// Creates a table reference for FROM/JOIN positions.
    #[must_use]
    pub fn from(name: &str) -> TableClause {
        TableClause::new(name)
    }

    /// Creates an unqualified field reference.
    #[must_use]
    pub fn field(name: &str) -> Expression {
        Expression::Field(FieldExpression::new(name))
    }

    /// Creates a table-qualified field reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Expression {
        Expression::Field(FieldExpression::qualified(table, name))
    }

    /// Creates a bound-value expression.
    #[must_use]
    pub fn val(value: impl ToSqlValue) -> Expression {
        Expression::Value(value.to_sql_value())
    }

    /// Creates a raw SQL fragment. Only for fragments free of user input.
    #[must_use]
    pub fn raw(sql: &str) -> Expression {
        Expression::Raw(String::from(sql))
    }

    /// `left = right`
    #[must_use]
    pub fn equals(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field().compare(CompareOp::Eq, right.into_operand())
    }

    /// `left != right`
    #[must_use]
    pub fn not_equals(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field()
            .compare(CompareOp::NotEq, right.into_operand())
    }

    /// `left > right`
    #[must_use]
    pub fn greater(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field().compare(CompareOp::Gt, right.into_operand())
    }

    /// `left >= right`
    #[must_use]
    pub fn greater_equal(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field()
            .compare(CompareOp::GtEq, right.into_operand())
    }

    /// `left < right`
    #[must_use]
    pub fn less(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field().compare(CompareOp::Lt, right.into_operand())
    }

    /// `left <= right`
    #[must_use]
    pub fn less_equal(left: impl IntoField, right: impl IntoOperand) -> Expression {
        left.into_field()
            .compare(CompareOp::LtEq, right.into_operand())
    }

    /// `left LIKE pattern`
    #[must_use]
    pub fn like(left: impl IntoField, pattern: impl IntoOperand) -> Expression {
        left.into_field()
            .compare(CompareOp::Like, pattern.into_operand())
    }

    /// `field IS NULL`
    #[must_use]
    pub fn is_null(field: impl IntoField) -> Expression {
        field
            .into_field()
            .compare(CompareOp::Eq, Expression::Value(SqlValue::Null))
    }

    /// `field IS NOT NULL`
    #[must_use]
    pub fn not_null(field: impl IntoField) -> Expression {
        field
            .into_field()
            .compare(CompareOp::NotEq, Expression::Value(SqlValue::Null))
    }

    /// `left AND right`
    #[must_use]
    pub fn and(left: Expression, right: Expression) -> Expression {
        left.and(right)
    }

    /// `left OR right`
    #[must_use]
    pub fn or(left: Expression, right: Expression) -> Expression {
        left.or(right)
    }

    /// AND over a list of operands; rejects an empty list.
    pub fn all(operands: Vec<Expression>) -> Result<Expression> {
        Self::combine(BoolOp::And, operands)
    }

    /// OR over a list of operands; rejects an empty list.
    pub fn any(operands: Vec<Expression>) -> Result<Expression> {
        Self::combine(BoolOp::Or, operands)
    }

    fn combine(op: BoolOp, operands: Vec<Expression>) -> Result<Expression> {
        if operands.is_empty() {
            return Err(QueryError::EmptyBoolean);
        }
        Ok(Expression::Boolean { op, operands })
    }

    /// `NOT (operand)`
    #[must_use]
    pub fn not(operand: Expression) -> Expression {
        operand.not()
    }

    /// A function call expression.
    #[must_use]
    pub fn func(name: &str, args: Vec<Expression>) -> Expression {
        Expression::Function {
            name: String::from(name),
            args,
        }
    }

    /// A WHERE clause from a raw string or expression.
    pub fn where_clause(condition: impl Into<Condition>) -> Result<WhereClause> {
        WhereClause::new(condition)
    }

    /// A HAVING clause from a raw string or expression.
    pub fn having(condition: impl Into<Condition>) -> Result<HavingClause> {
        HavingClause::new(condition)
    }

    /// An ascending ORDER BY term.
    #[must_use]
    pub fn ascending(field: impl IntoField) -> OrderClause {
        OrderClause::ascending(field.into_field())
    }

    /// A descending ORDER BY term.
    #[must_use]
    pub fn descending(field: impl IntoField) -> OrderClause {
        OrderClause::descending(field.into_field())
    }

    /// A UNION clause from a type tag (empty meaning DISTINCT).
    pub fn union(union_type: &str, query: Select) -> Result<UnionClause> {
        UnionClause::new(union_type, query)
    }

    /// A UNION ALL clause.
    #[must_use]
    pub fn union_all(query: Select) -> UnionClause {
        UnionClause::all(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::parameters::Parameters;

    #[test]
    fn test_equals_treats_lhs_as_field_rhs_as_value() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        let e = Q::equals("name", "Alice");
        assert_eq!(e.to_sql(&mut p).unwrap(), "\"name\" = :col1");
        assert_eq!(p.get("col1"), Some(&SqlValue::Text(String::from("Alice"))));
    }

    #[test]
    fn test_field_to_field_comparison() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        let e = Q::equals("a", Q::field("b"));
        assert_eq!(e.to_sql(&mut p).unwrap(), "\"a\" = \"b\"");
        assert!(p.is_empty());
    }

    #[test]
    fn test_all_rejects_empty() {
        assert_eq!(Q::all(vec![]), Err(QueryError::EmptyBoolean));
    }

    #[test]
    fn test_all_renders_n_ary() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        let e = Q::all(vec![
            Q::equals("a", 1),
            Q::equals("b", 2),
            Q::equals("c", 3),
        ])
        .unwrap();
        assert_eq!(
            e.to_sql(&mut p).unwrap(),
            "\"a\" = :col1 AND \"b\" = :col2 AND \"c\" = :col3"
        );
    }

    #[test]
    fn test_is_null_sugar() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        assert_eq!(Q::is_null("a").to_sql(&mut p).unwrap(), "\"a\" IS NULL");
        assert_eq!(
            Q::not_null("a").to_sql(&mut p).unwrap(),
            "\"a\" IS NOT NULL"
        );
    }

    #[test]
    fn test_subquery_operand() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        let sub = Q::select().fields(&["id"]).from("banned");
        let e = Q::equals("user_id", sub);
        assert_eq!(
            e.to_sql(&mut p).unwrap(),
            "\"user_id\" = (SELECT \"id\" FROM \"banned\")"
        );
    }

    #[test]
    fn test_option_operand_becomes_null() {
        let d = AnsiDialect;
        let mut p = Parameters::new(&d);
        let e = Q::equals("a", Option::<i64>::None);
        assert_eq!(e.to_sql(&mut p).unwrap(), "\"a\" IS NULL");
    }
}
