//! Table lifecycle
//!
//! Creates, verifies, destroys and imports a single declared table. Every
//! operation is a short, fixed sequence of round-trips through the
//! [`DataAccess`] capability; nothing is retried and no state is kept
//! between calls.

use crate::db::client::DataAccess;
use crate::error::{Error, Result};
use crate::schema::analyzer::MetadataReader;
use crate::schema::diff::SchemaComparator;
use crate::schema::generator::{create_table_sql, drop_table_sql};
use crate::schema::types::{Column, DesiredTable, TableId};

/// Result of a verification pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The live table matches the declaration
    InSync(DesiredTable),
    /// The table no longer exists; the caller should stop tracking it
    Gone,
}

/// A table identity paired with its resolved declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTable {
    pub id: TableId,
    pub table: DesiredTable,
}

/// What applying a new declaration over a tracked one would take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    NoChange,
    /// Identity changed: destroy the old table, then create the new one
    Replace { reason: String },
    /// Shape changed in place; refused by [`Reconciler::update`]
    Update,
}

/// Drives tables from declared state towards ClickHouse
pub struct Reconciler<C> {
    client: C,
    reader: MetadataReader<C>,
    comparator: SchemaComparator,
    default_database: String,
    aggregate_mismatches: bool,
}

impl<C: DataAccess + Clone> Reconciler<C> {
    pub fn new(client: C, comparator: SchemaComparator, default_database: &str) -> Self {
        Self {
            reader: MetadataReader::new(client.clone()),
            client,
            comparator,
            default_database: default_database.to_string(),
            aggregate_mismatches: false,
        }
    }

    /// Report every divergence on verify instead of the first category only
    pub fn aggregate_mismatches(mut self, aggregate: bool) -> Self {
        self.aggregate_mismatches = aggregate;
        self
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    pub fn comparator(&self) -> &SchemaComparator {
        &self.comparator
    }

    /// Create the table. Returns its identity and the resolved declaration.
    pub async fn create(&self, desired: &DesiredTable) -> Result<TrackedTable> {
        let table = desired.with_default_database(&self.default_database);
        let id = table.id(&self.default_database);
        let sql = create_table_sql(&table, &self.default_database);

        tracing::info!(sql = %sql, "Creating ClickHouse table");

        self.client
            .execute(&sql)
            .await
            .map_err(|source| Error::Execution {
                table: id.clone(),
                statement: sql.clone(),
                source,
            })?;

        tracing::info!(id = %id, "Successfully created ClickHouse table");

        Ok(TrackedTable { id, table })
    }

    /// Re-read the table behind `id` and compare it with `desired`
    pub async fn verify(&self, id: &str, desired: &DesiredTable) -> Result<VerifyOutcome> {
        let id: TableId = id.parse()?;

        let Some(actual) = self.reader.read_table(&id, self.comparator.family()).await? else {
            tracing::info!(id = %id, "Table no longer exists, removing from state");
            return Ok(VerifyOutcome::Gone);
        };

        if self.aggregate_mismatches {
            self.comparator.compare_all(desired, &actual)?;
        } else {
            self.comparator.compare(desired, &actual)?;
        }

        tracing::info!(
            id = %id,
            engine = %actual.engine,
            "Table schema validation successful"
        );

        Ok(VerifyOutcome::InSync(desired.clone()))
    }

    /// Drop the table. Dropping a table that is already gone succeeds.
    pub async fn destroy(&self, desired: &DesiredTable) -> Result<()> {
        let id = desired.id(&self.default_database);
        let sql = drop_table_sql(desired, &self.default_database);

        tracing::info!(sql = %sql, "Dropping ClickHouse table");

        self.client
            .execute(&sql)
            .await
            .map_err(|source| Error::Execution {
                table: id.clone(),
                statement: sql.clone(),
                source,
            })?;

        tracing::info!(id = %id, "Successfully dropped ClickHouse table");
        Ok(())
    }

    /// Reconstruct a declaration from an existing table
    pub async fn import(&self, id: &str) -> Result<TrackedTable> {
        let id: TableId = id.parse()?;

        tracing::info!(
            database = %id.database,
            table = %id.name,
            id = %id,
            "Importing ClickHouse table"
        );

        let actual = self
            .reader
            .read_table(&id, self.comparator.family())
            .await?
            .ok_or_else(|| Error::NotFound { table: id.clone() })?;

        let columns: Vec<Column> = actual
            .columns
            .into_iter()
            .map(|(name, column)| Column {
                name,
                data_type: column.data_type,
                comment: Some(column.comment).filter(|c| !c.is_empty()),
            })
            .collect();

        let table = DesiredTable {
            name: id.name.clone(),
            database: Some(id.database.clone()),
            engine: actual.engine,
            columns,
            order_by: actual.order_by,
        };

        tracing::info!(
            id = %id,
            engine = %table.engine,
            columns = table.columns.len(),
            "Successfully imported ClickHouse table"
        );

        Ok(TrackedTable { id, table })
    }

    /// In-place changes are never applied
    pub fn update(&self, prior: &DesiredTable, desired: &DesiredTable) -> Result<()> {
        Err(Error::UnsupportedOperation(format!(
            "updating table {} in place is not implemented; destroy and recreate it instead (requested {})",
            prior.id(&self.default_database),
            desired.id(&self.default_database)
        )))
    }

    /// Decide what moving from `prior` to `desired` requires
    pub fn plan(&self, prior: Option<&DesiredTable>, desired: &DesiredTable) -> PlannedAction {
        let Some(prior) = prior else {
            return PlannedAction::Create;
        };

        let prior = prior.with_default_database(&self.default_database);
        let desired = desired.with_default_database(&self.default_database);

        let prior_id = prior.id(&self.default_database);
        let desired_id = desired.id(&self.default_database);
        if prior_id != desired_id {
            return PlannedAction::Replace {
                reason: format!("identity changes from {} to {}", prior_id, desired_id),
            };
        }

        if prior == desired {
            PlannedAction::NoChange
        } else {
            PlannedAction::Update
        }
    }
}
