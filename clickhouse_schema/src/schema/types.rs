//! Type definitions for declared and observed tables

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Identity key of a table: `<database>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId {
    pub database: String,
    pub name: String,
}

impl TableId {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.name)
    }
}

impl FromStr for TableId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 {
            return Err(Error::InvalidIdentity(format!(
                "expected format 'database.table', got: {}",
                s
            )));
        }
        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(Error::InvalidIdentity(format!(
                "database and table names cannot be empty, got: {}",
                s
            )));
        }

        Ok(Self::new(parts[0], parts[1]))
    }
}

/// The declared target shape of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl DesiredTable {
    /// Create a table declaration without columns
    pub fn new(name: &str, engine: &str) -> Self {
        Self {
            name: name.to_string(),
            database: None,
            engine: engine.to_string(),
            order_by: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Place the table in a database
    pub fn in_database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    /// Append a column
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the ORDER BY key
    pub fn order_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a copy whose database is filled in with `default` when absent
    pub fn with_default_database(&self, default: &str) -> Self {
        let mut resolved = self.clone();
        if resolved.database.is_none() {
            resolved.database = Some(default.to_string());
        }
        resolved
    }

    /// Identity key, resolving an absent database to `default`
    pub fn id(&self, default: &str) -> TableId {
        TableId::new(self.database.as_deref().unwrap_or(default), &self.name)
    }

    /// Structural checks on a declaration before it is used
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::ValidationError("table name cannot be empty".into()));
        }
        if self.name.contains('.') {
            return Err(Error::ValidationError(format!(
                "table name '{}' cannot contain '.'",
                self.name
            )));
        }
        if let Some(database) = &self.database {
            if database.is_empty() || database.contains('.') {
                return Err(Error::ValidationError(format!(
                    "table '{}': invalid database name '{}'",
                    self.name, database
                )));
            }
        }
        if self.engine.is_empty() {
            return Err(Error::ValidationError(format!(
                "table '{}': engine cannot be empty",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() || column.data_type.is_empty() {
                return Err(Error::ValidationError(format!(
                    "table '{}': columns need both a name and a type",
                    self.name
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(Error::ValidationError(format!(
                    "table '{}': duplicate column '{}'",
                    self.name, column.name
                )));
            }
        }

        Ok(())
    }
}

/// A declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Column {
    /// Create a new column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            comment: None,
        }
    }

    /// Attach a comment to the column
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}

/// A table as observed in `system.tables` / `system.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualTable {
    pub id: TableId,
    pub engine: String,
    /// Keyed by column name, in `position` order
    pub columns: IndexMap<String, ActualColumn>,
    pub order_by: Vec<String>,
}

/// A column as observed in `system.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualColumn {
    pub data_type: String,
    /// ClickHouse never reports a NULL comment; no comment reads back as ""
    pub comment: String,
}
