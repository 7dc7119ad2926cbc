//! Scalar schema types shared by columns and drivers.

use serde::{Deserialize, Serialize};

/// Declared SQL column types.
///
/// Backend-specific spellings live on the drivers; the model stays neutral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// Integer (32-bit).
    Integer,
    /// Big integer (64-bit).
    BigInt,
    /// Small integer (16-bit).
    SmallInt,
    /// Unbounded text.
    Text,
    /// Variable-length character string.
    Varchar(usize),
    /// Fixed-length character string.
    Char(usize),
    /// Boolean.
    Boolean,
    /// Date and time.
    DateTime,
    /// Date only.
    Date,
    /// Floating point (single precision).
    Real,
    /// Floating point (double precision).
    Double,
    /// Decimal with precision and scale.
    Decimal(u8, u8),
    /// Binary large object.
    Blob,
}

impl SqlType {
    /// Parses a declared type name as reported by backend introspection.
    ///
    /// Length/precision arguments in the source string are preserved where
    /// they carry meaning; unrecognized names yield `None` so callers can
    /// decide on a fallback.
    #[must_use]
    pub fn parse(declared: &str) -> Option<Self> {
        let upper = declared.trim().to_ascii_uppercase();
        let (base, args) = match upper.find('(') {
            Some(open) => {
                let close = upper.rfind(')')?;
                (upper[..open].trim().to_string(), Some(&upper[open + 1..close]))
            }
            None => (upper.clone(), None),
        };

        let parse_len = |args: Option<&str>| -> Option<usize> {
            args.and_then(|a| a.split(',').next())
                .and_then(|a| a.trim().parse().ok())
        };

        match base.as_str() {
            "INT" | "INTEGER" | "INT4" => Some(Self::Integer),
            "BIGINT" | "INT8" => Some(Self::BigInt),
            "SMALLINT" | "INT2" => Some(Self::SmallInt),
            "TEXT" | "CLOB" => Some(Self::Text),
            // A varying type with no declared length is unbounded.
            "VARCHAR" | "CHARACTER VARYING" => match parse_len(args) {
                Some(n) => Some(Self::Varchar(n)),
                None => Some(Self::Text),
            },
            "CHAR" | "CHARACTER" => Some(Self::Char(parse_len(args).unwrap_or(1))),
            "BOOL" | "BOOLEAN" => Some(Self::Boolean),
            "TIMESTAMP" | "DATETIME" | "TIMESTAMP WITHOUT TIME ZONE" => Some(Self::DateTime),
            "DATE" => Some(Self::Date),
            "REAL" | "FLOAT4" => Some(Self::Real),
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => Some(Self::Double),
            "DECIMAL" | "NUMERIC" => {
                let mut parts = args.unwrap_or("").split(',');
                let precision = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
                let scale = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
                Some(Self::Decimal(precision, scale))
            }
            "BLOB" | "BYTEA" => Some(Self::Blob),
            _ => None,
        }
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DefaultValue {
    /// No default.
    #[default]
    None,
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// SQL expression (e.g. `CURRENT_TIMESTAMP`), rendered verbatim.
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation, or `None` when no default is set.
    #[must_use]
    pub fn to_sql(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Null => Some(String::from("NULL")),
            Self::Bool(b) => Some(String::from(if *b { "1" } else { "0" })),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::Expression(expr) => Some(expr.clone()),
        }
    }
}

/// Referential action on update/delete of a referred row.
///
/// Only the three defined kinds exist; there is no NO ACTION or SET DEFAULT
/// in this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForeignKeyAction {
    /// Propagate the change to referencing rows.
    Cascade,
    /// Refuse the change while references exist.
    #[default]
    Restrict,
    /// Set the referencing columns to NULL.
    SetNull,
}

impl ForeignKeyAction {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn to_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
        }
    }

    /// Parses an action as reported by backend introspection.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CASCADE" => Some(Self::Cascade),
            "RESTRICT" => Some(Self::Restrict),
            "SET NULL" => Some(Self::SetNull),
            _ => None,
        }
    }
}
