//! Database schema model: tables, columns, indexes, and foreign keys.
//!
//! Definitions are plain data with validating mutators, independent of any
//! particular database backend. Drivers turn them into dialect-specific DDL
//! and read them back through introspection.
//!
//! ```
//! use quarry_schema::{Column, Index, SqlType, Table};
//!
//! let mut users = Table::new("users");
//! users.add_column(Column::new("id", SqlType::BigInt).serial())?;
//! users.add_column(Column::new("name", SqlType::Varchar(255)).not_null())?;
//! users.add_index(Index::primary(vec![String::from("id")])?)?;
//!
//! assert_eq!(users.primary().unwrap().columns(), ["id"]);
//! # Ok::<(), quarry_schema::SchemaError>(())
//! ```

pub mod column;
pub mod error;
pub mod foreign_key;
pub mod index;
pub mod repository;
pub mod table;
pub mod types;

pub use column::Column;
pub use error::{Result, SchemaError};
pub use foreign_key::ForeignKey;
pub use index::{Index, IndexType};
pub use repository::TableRepository;
pub use table::Table;
pub use types::{DefaultValue, ForeignKeyAction, SqlType};
