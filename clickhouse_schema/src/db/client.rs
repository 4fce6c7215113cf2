//! Data-access capability
//!
//! The reconciler only talks to ClickHouse through [`DataAccess`]. The HTTP
//! implementation lives in [`crate::db::connection`]; tests supply their own.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a [`DataAccess`] implementation
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ClickHouse returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Could not decode response row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Query returned no rows")]
    NoRows,

    #[error("Row has no field '{0}'")]
    MissingField(String),

    #[error("Field '{field}' is not a string: {value}")]
    UnexpectedType { field: String, value: Value },
}

/// A single result row, keyed by column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Read a string field that must be present and non-null
    pub fn get_str(&self, field: &str) -> Result<&str, ClientError> {
        self.get_opt_str(field)?
            .ok_or_else(|| ClientError::MissingField(field.to_string()))
    }

    /// Read a string field; absent and NULL both read as `None`
    pub fn get_opt_str(&self, field: &str) -> Result<Option<&str>, ClientError> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(ClientError::UnexpectedType {
                field: field.to_string(),
                value: other.clone(),
            }),
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Query parameters, bound by name to `{name:Type}` placeholders
pub type Params<'a> = [(&'a str, &'a str)];

/// What the reconciler needs from a database connection.
///
/// Each call is one round-trip. Implementations must not spawn work that
/// outlives the returned future, so dropping the future cancels the request.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Execute a statement that returns no rows
    async fn execute(&self, sql: &str) -> Result<(), ClientError>;

    /// Run a query and collect every row
    async fn query(&self, sql: &str, params: &Params<'_>) -> Result<Vec<Row>, ClientError>;

    /// Run a query expected to return at most one row
    async fn query_row(&self, sql: &str, params: &Params<'_>) -> Result<Option<Row>, ClientError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }
}
