//! Table metadata reader
//!
//! Reads what ClickHouse reports about a single table from `system.tables`
//! and `system.columns`.

use indexmap::IndexMap;

use crate::db::client::{ClientError, DataAccess};
use crate::error::{Error, Result};
use crate::schema::diff::EngineFamily;
use crate::schema::types::{ActualColumn, ActualTable, TableId};

pub const TABLE_ENGINE_SQL: &str = r#"
    SELECT engine
    FROM system.tables
    WHERE database = {database:String} AND name = {table:String}
"#;

pub const TABLE_COLUMNS_SQL: &str = r#"
    SELECT name, type, comment
    FROM system.columns
    WHERE database = {database:String} AND table = {table:String}
    ORDER BY position
"#;

pub const SORTING_KEY_SQL: &str = r#"
    SELECT sorting_key
    FROM system.tables
    WHERE database = {database:String} AND name = {table:String}
"#;

/// Reads live table metadata through a [`DataAccess`] capability
#[derive(Debug, Clone)]
pub struct MetadataReader<C> {
    client: C,
}

impl<C: DataAccess> MetadataReader<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Engine of the table, or `None` when the table does not exist
    pub async fn engine(&self, id: &TableId) -> Result<Option<String>> {
        let row = self
            .client
            .query_row(TABLE_ENGINE_SQL, &Self::params(id))
            .await
            .map_err(|source| Self::query_error(id, "check if table exists", source))?;

        match row {
            Some(row) => {
                let engine = row
                    .get_str("engine")
                    .map_err(|source| Self::query_error(id, "check if table exists", source))?;
                Ok(Some(engine.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Columns keyed by name, in the table's `position` order
    pub async fn columns(&self, id: &TableId) -> Result<IndexMap<String, ActualColumn>> {
        let rows = self
            .client
            .query(TABLE_COLUMNS_SQL, &Self::params(id))
            .await
            .map_err(|source| Self::query_error(id, "read schema", source))?;

        let mut columns = IndexMap::with_capacity(rows.len());
        for row in rows {
            let read = || -> std::result::Result<(String, ActualColumn), ClientError> {
                Ok((
                    row.get_str("name")?.to_string(),
                    ActualColumn {
                        data_type: row.get_str("type")?.to_string(),
                        comment: row.get_opt_str("comment")?.unwrap_or_default().to_string(),
                    },
                ))
            };
            let (name, column) = read().map_err(|source| Self::query_error(id, "read schema", source))?;
            columns.insert(name, column);
        }

        Ok(columns)
    }

    /// Columns of the table's sorting key, in key order
    pub async fn order_by(&self, id: &TableId) -> Result<Vec<String>> {
        let row = self
            .client
            .query_row(SORTING_KEY_SQL, &Self::params(id))
            .await
            .and_then(|row| row.ok_or(ClientError::NoRows))
            .map_err(|source| Self::query_error(id, "read ORDER BY", source))?;

        let sorting_key = row
            .get_opt_str("sorting_key")
            .map_err(|source| Self::query_error(id, "read ORDER BY", source))?;

        Ok(parse_sorting_key(sorting_key))
    }

    /// Read everything the comparator needs, or `None` when the table is gone.
    ///
    /// The sorting key is only queried for engines in `family`.
    pub async fn read_table(&self, id: &TableId, family: &EngineFamily) -> Result<Option<ActualTable>> {
        let Some(engine) = self.engine(id).await? else {
            return Ok(None);
        };

        let columns = self.columns(id).await?;
        let order_by = if family.is_ordered(&engine) {
            self.order_by(id).await?
        } else {
            Vec::new()
        };

        Ok(Some(ActualTable {
            id: id.clone(),
            engine,
            columns,
            order_by,
        }))
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn params(id: &TableId) -> [(&str, &str); 2] {
        [("database", id.database.as_str()), ("table", id.name.as_str())]
    }

    fn query_error(id: &TableId, operation: &'static str, source: ClientError) -> Error {
        Error::Query {
            table: id.clone(),
            operation,
            source,
        }
    }
}

/// Split a `sorting_key` value into column names.
///
/// An enclosing pair of parentheses is stripped, then the value is split on
/// commas and each element trimmed. Empty or absent keys give no columns.
pub fn parse_sorting_key(sorting_key: Option<&str>) -> Vec<String> {
    let key = sorting_key.unwrap_or("").trim();
    let key = key
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(key);

    if key.trim().is_empty() {
        return Vec::new();
    }

    key.split(',').map(|column| column.trim().to_string()).collect()
}
