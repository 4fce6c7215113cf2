//! clickhouse_schema: declarative table management for ClickHouse
//!
//! Tables are declared (name, database, engine, columns, ORDER BY key) and
//! reconciled against what the server reports: created when missing,
//! verified for drift, dropped, or imported from an existing table. Drift is
//! reported, never altered away in place.

pub mod config;
pub mod db;
pub mod error;
pub mod reconciler;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use db::{ClickHouseClient, ClientError, DataAccess, Row};
pub use error::{Error, Result};
pub use reconciler::{PlannedAction, Reconciler, TrackedTable, VerifyOutcome};
pub use schema::{Column, DesiredTable, MismatchReport, SchemaComparator, TableId};

/// Load the configuration file and connect to the configured server
pub async fn init(config_path: &str) -> Result<SchemaClient<ClickHouseClient>> {
    let config = config::load_from_file(config_path)?;
    let client = ClickHouseClient::connect(&config.clickhouse).await?;
    Ok(SchemaClient::new(config, client))
}

/// Runs lifecycle operations for the tables declared in a [`Config`]
pub struct SchemaClient<C> {
    config: Config,
    reconciler: Reconciler<C>,
}

impl<C: DataAccess + Clone> SchemaClient<C> {
    pub fn new(config: Config, client: C) -> Self {
        let comparator = SchemaComparator::new(config.schema.engine_family());
        let reconciler = Reconciler::new(client, comparator, &config.clickhouse.database)
            .aggregate_mismatches(config.schema.aggregate_mismatches);

        Self { config, reconciler }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reconciler(&self) -> &Reconciler<C> {
        &self.reconciler
    }

    /// The declaration for `id`, or a configuration error if none exists
    pub fn declared(&self, id: &str) -> Result<&DesiredTable> {
        let id: TableId = id.parse()?;
        self.config
            .declared_table(&id)
            .ok_or_else(|| Error::ConfigError(format!("table {} is not declared", id)))
    }

    /// `CREATE TABLE` statement for a declared table, without executing it
    pub fn create_sql(&self, id: &str) -> Result<String> {
        let table = self.declared(id)?;
        Ok(schema::create_table_sql(table, self.reconciler.default_database()))
    }

    pub async fn create(&self, id: &str) -> Result<TrackedTable> {
        self.reconciler.create(self.declared(id)?).await
    }

    pub async fn verify(&self, id: &str) -> Result<VerifyOutcome> {
        self.reconciler.verify(id, self.declared(id)?).await
    }

    pub async fn destroy(&self, id: &str) -> Result<()> {
        self.reconciler.destroy(self.declared(id)?).await
    }

    pub async fn import(&self, id: &str) -> Result<TrackedTable> {
        self.reconciler.import(id).await
    }

    /// Verify every declared table, in declaration order
    pub async fn check_all(&self) -> Vec<(TableId, Result<VerifyOutcome>)> {
        let mut results = Vec::with_capacity(self.config.tables.len());
        for table in &self.config.tables {
            let id = table.id(self.reconciler.default_database());
            let outcome = self.reconciler.verify(&id.to_string(), table).await;
            results.push((id, outcome));
        }
        results
    }
}
