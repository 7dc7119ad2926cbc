//! # quarry-driver
//!
//! Database backends for the quarry query and schema models. The [`Driver`]
//! trait renders CRUD and DDL statements into a backend's dialect; the
//! concrete [`SqliteDriver`] and [`PostgresDriver`] add execution over a
//! `sqlx` pool and schema introspection.
//!
//! ```no_run
//! use quarry_driver::{FieldMatch, Record, SqliteDriver, WhereSpec};
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! # async fn demo() -> Result<(), quarry_driver::DriverError> {
//! let pool = SqlitePoolOptions::new().connect(":memory:").await?;
//! let driver = SqliteDriver::new(pool);
//!
//! let id = driver
//!     .insert("users", &Record::new().set("name", "Alice"))
//!     .await?;
//! let rows = driver
//!     .select(
//!         "users",
//!         &[],
//!         Some(&WhereSpec::fields().field("id", FieldMatch::value(id))),
//!         None,
//!     )
//!     .await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod config;
pub mod driver;
pub mod error;
pub mod postgres;
pub mod record;
pub mod sqlite;

pub use condition::{FieldMatch, OrderSpec, OrderTerm, WhereSpec};
pub use config::DriverConfig;
pub use driver::{bind_order, Driver};
pub use error::{DriverError, Result};
pub use postgres::{PgDialect, PostgresDriver};
pub use record::Record;
pub use sqlite::{SqliteDialect, SqliteDriver};
