//! Error types for clickhouse_schema

use thiserror::Error;

use crate::db::ClientError;
use crate::schema::diff::MismatchReport;
use crate::schema::types::TableId;

/// Result type for clickhouse_schema operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for clickhouse_schema
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid table identifier: {0}")]
    InvalidIdentity(String),

    #[error("Table {table} does not exist in ClickHouse")]
    NotFound { table: TableId },

    #[error(transparent)]
    Mismatch(#[from] MismatchReport),

    #[error("Could not execute statement for table {table}: {source}")]
    Execution {
        table: TableId,
        statement: String,
        #[source]
        source: ClientError,
    },

    #[error("Could not {operation} for table {table}: {source}")]
    Query {
        table: TableId,
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("Database error: {0}")]
    DatabaseError(#[from] ClientError),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// The table this error is about, when it concerns a single table
    pub fn table(&self) -> Option<&TableId> {
        match self {
            Error::NotFound { table }
            | Error::Execution { table, .. }
            | Error::Query { table, .. } => Some(table),
            Error::Mismatch(report) => Some(&report.table),
            _ => None,
        }
    }
}

/// Convert Serde JSON errors to clickhouse_schema errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to clickhouse_schema errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(error: toml::ser::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}
