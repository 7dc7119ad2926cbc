//! Error types for query construction and rendering.

/// Errors raised while building or rendering a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A clause that requires a condition was given an empty one.
    #[error("Provide {0} condition")]
    MissingCondition(&'static str),

    /// A UNION clause was constructed with an unrecognized type tag.
    #[error("Invalid UNION type: {0}")]
    InvalidUnionType(String),

    /// A comparison operator string could not be parsed.
    #[error("Invalid comparison operator: {0}")]
    UnknownOperator(String),

    /// NULL was compared with an operator other than `=` or `!=`.
    #[error("Cannot compare NULL using operator {0}")]
    NullComparison(String),

    /// A boolean combination was constructed without operands.
    #[error("Boolean condition requires at least one operand")]
    EmptyBoolean,
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
