//! Configuration handling for clickhouse_schema

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};
use crate::schema::diff::EngineFamily;
use crate::schema::types::{DesiredTable, TableId};

/// Database used when neither the table nor the connection names one
pub const DEFAULT_DATABASE: &str = "default";

/// Load and validate configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config = read_from_file(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML file without validating the declared tables.
///
/// Validation logs warnings, so callers that install logging from the file
/// itself validate afterwards.
pub fn read_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))
}

/// Represents the complete configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub tables: Vec<DesiredTable>,
}

impl Config {
    /// Check every declared table and reject duplicate identities
    pub fn validate(&self) -> Result<()> {
        let family = self.schema.engine_family();
        let mut seen = Vec::new();

        for table in &self.tables {
            table.validate()?;

            let id = table.id(&self.clickhouse.database);
            if seen.contains(&id) {
                return Err(Error::ConfigError(format!("table {} is declared more than once", id)));
            }

            if !table.order_by.is_empty() && !family.is_ordered(&table.engine) {
                tracing::warn!(
                    id = %id,
                    engine = %table.engine,
                    "ORDER BY declared for an engine outside the MergeTree family"
                );
            }
            seen.push(id);
        }

        Ok(())
    }

    /// Find a declared table by identity
    pub fn declared_table(&self, id: &TableId) -> Option<&DesiredTable> {
        self.tables
            .iter()
            .find(|table| &table.id(&self.clickhouse.database) == id)
    }
}

/// ClickHouse connection parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ClickHouseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Also the database tables land in when they do not name one
    pub database: String,
    pub secure: bool,
    pub timeout_seconds: u64,
    pub max_execution_time: Option<u64>,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8123,
            username: "default".to_string(),
            password: String::new(),
            database: DEFAULT_DATABASE.to_string(),
            secure: false,
            timeout_seconds: 30,
            max_execution_time: Some(60),
        }
    }
}

/// Comparison behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SchemaConfig {
    /// Engine prefixes treated as ordered storage; MergeTree family when unset
    pub ordered_engines: Option<Vec<String>>,
    /// Report every divergence instead of stopping at the first category
    pub aggregate_mismatches: bool,
}

impl SchemaConfig {
    pub fn engine_family(&self) -> EngineFamily {
        match &self.ordered_engines {
            Some(prefixes) => EngineFamily::new(prefixes.iter().cloned()),
            None => EngineFamily::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.clickhouse.host, "localhost");
        assert_eq!(config.clickhouse.port, 8123);
        assert_eq!(config.clickhouse.database, DEFAULT_DATABASE);
        assert_eq!(config.clickhouse.max_execution_time, Some(60));
        assert!(config.logging.is_none());
        assert!(config.tables.is_empty());
        assert!(config.schema.engine_family().is_ordered("MergeTree"));
    }

    #[test]
    fn ordered_engines_override_family() {
        let config: Config = toml::from_str(
            r#"
            [schema]
            ordered_engines = ["ReplicatedMergeTree"]
            "#,
        )
        .unwrap();

        let family = config.schema.engine_family();
        assert!(family.is_ordered("ReplicatedMergeTree"));
        assert!(!family.is_ordered("MergeTree"));
    }

    #[test]
    fn duplicate_identities_are_rejected() {
        let config: Config = toml::from_str(
            r#"
            [[tables]]
            name = "events"
            engine = "Log"

            [[tables]]
            name = "events"
            database = "default"
            engine = "Memory"
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("default.events is declared more than once"));
    }

    #[test]
    fn declared_tables_resolve_default_database() {
        let config: Config = toml::from_str(
            r#"
            [clickhouse]
            database = "analytics"

            [[tables]]
            name = "events"
            engine = "Log"
            "#,
        )
        .unwrap();

        let id: TableId = "analytics.events".parse().unwrap();
        assert_eq!(config.declared_table(&id).map(|t| t.name.as_str()), Some("events"));
        assert!(config.declared_table(&"default.events".parse().unwrap()).is_none());
    }
}
