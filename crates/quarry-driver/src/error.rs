//! Driver error types.

use thiserror::Error;

/// Errors raised while generating or executing backend SQL.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Database error from the underlying pool.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query rendering failed.
    #[error(transparent)]
    Query(#[from] quarry_query::QueryError),

    /// Schema definition was invalid.
    #[error(transparent)]
    Schema(#[from] quarry_schema::SchemaError),

    /// An ORDER BY term used a direction other than ASC or DESC.
    #[error("Invalid order direction: {0}")]
    UnknownDirection(String),

    /// The dialect cannot perform the requested operation.
    #[error("{dialect} does not support {operation}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Human-readable operation description.
        operation: &'static str,
    },

    /// Introspection found no table with the given name.
    #[error("No such table: {0}")]
    NoSuchTable(String),
}

/// Convenience result alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;
