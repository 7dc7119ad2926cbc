//! Driver configuration.

use serde::Deserialize;

/// Settings shared by every driver, deserializable from application config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverConfig {
    /// Prefix prepended to every table name before quoting.
    #[serde(default)]
    pub table_prefix: String,
}

impl DriverConfig {
    /// Creates a configuration with no table prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table-name prefix.
    #[must_use]
    pub fn table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let config: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.table_prefix, "");
    }

    #[test]
    fn test_deserialize_prefix() {
        let config: DriverConfig = serde_json::from_str(r#"{"table_prefix": "app_"}"#).unwrap();
        assert_eq!(config.table_prefix, "app_");
    }
}
