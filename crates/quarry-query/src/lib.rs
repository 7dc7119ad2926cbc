//! # quarry-query
//!
//! Backend-neutral SQL query model: an expression/clause tree, a parameter
//! binding context, and a fluent builder facade.
//!
//! A query is a tree of typed nodes. Rendering walks the tree with a
//! [`Parameters`] context that carries the active [`Dialect`] (identifier
//! quoting, placeholder syntax) and accumulates bound values under generated
//! names (`col1`, `col2`, ...). Literals are never inlined into SQL text.
//!
//! ```
//! use quarry_query::{AnsiDialect, Parameters, Q, SqlValue};
//!
//! let query = Q::select()
//!     .from("users")
//!     .where_clause(Q::where_clause(Q::equals("name", "Alice")).unwrap());
//!
//! let dialect = AnsiDialect;
//! let mut params = Parameters::new(&dialect);
//! let sql = query.to_sql(&mut params).unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"name\" = :col1");
//! assert_eq!(params.get("col1"), Some(&SqlValue::Text("Alice".into())));
//! ```

pub mod builder;
pub mod clause;
pub mod dialect;
pub mod error;
pub mod expression;
pub mod parameters;
pub mod select;
pub mod value;

pub use builder::{IntoField, IntoOperand, Q};
pub use clause::{
    Condition, Direction, HavingClause, JoinClause, JoinType, OrderClause, TableClause,
    UnionClause, UnionType, WhereClause,
};
pub use dialect::{AnsiDialect, Dialect};
pub use error::{QueryError, Result};
pub use expression::{BoolOp, CompareOp, Expression, FieldExpression};
pub use parameters::Parameters;
pub use select::{Select, SelectField};
pub use value::{SqlValue, ToSqlValue};
