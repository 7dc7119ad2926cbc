//! Error types for the schema model.

/// Errors raised while constructing or mutating schema objects.
///
/// These are all caller bugs surfaced synchronously at the mutating call;
/// the object's prior state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A table with this name is already registered.
    #[error("Duplicate table: {0}")]
    DuplicateTable(String),

    /// The table is not present in the registry.
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// A column with this name already exists on the table.
    #[error("Duplicate column '{column}' on table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// The named column does not exist on the table.
    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// The named index does not exist on the table.
    #[error("Unknown index '{index}' on table '{table}'")]
    UnknownIndex {
        /// Table name.
        table: String,
        /// Index name.
        index: String,
    },

    /// The named foreign key does not exist on the table.
    #[error("Unknown foreign key '{foreign_key}' on table '{table}'")]
    UnknownForeignKey {
        /// Table name.
        table: String,
        /// Foreign key name.
        foreign_key: String,
    },

    /// A column cannot be removed while indexes or foreign keys reference it.
    #[error("Column '{column}' on table '{table}' is referenced by: {}", blockers.join(", "))]
    ColumnInUse {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
        /// Names of the indexes/foreign keys blocking the removal.
        blockers: Vec<String>,
    },

    /// The table already has a primary index.
    #[error("Table '{0}' already has a primary index")]
    PrimaryIndexExists(String),

    /// An index or foreign key was given no columns.
    #[error("{0} requires at least one column")]
    EmptyColumnList(&'static str),

    /// A composite foreign key's local and referred column counts differ.
    #[error("Foreign key column count mismatch: {local} local vs {referred} referred")]
    ColumnCountMismatch {
        /// Number of local columns.
        local: usize,
        /// Number of referred columns.
        referred: usize,
    },
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
