//! In-memory stand-in for a ClickHouse server

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use clickhouse_schema::db::client::Params;
use clickhouse_schema::schema::analyzer::{SORTING_KEY_SQL, TABLE_COLUMNS_SQL, TABLE_ENGINE_SQL};
use clickhouse_schema::{ClientError, DataAccess, Row};

/// A table as the mock server reports it
#[derive(Debug, Clone)]
pub struct MockTable {
    pub engine: String,
    /// (name, type, comment) in position order
    pub columns: Vec<(String, String, String)>,
    pub sorting_key: String,
}

impl MockTable {
    pub fn new(engine: &str, sorting_key: &str) -> Self {
        Self {
            engine: engine.to_string(),
            columns: Vec::new(),
            sorting_key: sorting_key.to_string(),
        }
    }

    pub fn column(mut self, name: &str, data_type: &str, comment: &str) -> Self {
        self.columns
            .push((name.to_string(), data_type.to_string(), comment.to_string()));
        self
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<(String, String), MockTable>,
    executed: Vec<String>,
    queries: Vec<String>,
    fail_with: Option<String>,
    vanish_after_engine: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<State>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, database: &str, name: &str, table: MockTable) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert((database.to_string(), name.to_string()), table);
        self
    }

    /// Make every following round-trip fail with a server error
    pub fn failing(self, message: &str) -> Self {
        self.state.lock().unwrap().fail_with = Some(message.to_string());
        self
    }

    /// Drop every table as soon as its engine has been reported
    pub fn vanishing_after_engine(self) -> Self {
        self.state.lock().unwrap().vanish_after_engine = true;
        self
    }

    pub fn drop_table(&self, database: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .tables
            .remove(&(database.to_string(), name.to_string()));
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    /// Names of the metadata queries received, in order
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    fn check_failure(state: &State) -> Result<(), ClientError> {
        match &state.fail_with {
            Some(message) => Err(ClientError::Server {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn param<'a>(params: &Params<'a>, name: &str) -> &'a str {
    params
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
        .unwrap_or_else(|| panic!("missing query parameter {}", name))
}

fn row(value: serde_json::Value) -> Row {
    match value {
        serde_json::Value::Object(map) => Row::new(map),
        other => panic!("not an object: {}", other),
    }
}

#[async_trait]
impl DataAccess for MockClient {
    async fn execute(&self, sql: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_string());
        Self::check_failure(&state)
    }

    async fn query(&self, sql: &str, params: &Params<'_>) -> Result<Vec<Row>, ClientError> {
        let mut state = self.state.lock().unwrap();
        let name = match sql {
            s if s == TABLE_ENGINE_SQL => "engine",
            s if s == TABLE_COLUMNS_SQL => "columns",
            s if s == SORTING_KEY_SQL => "sorting_key",
            other => panic!("unexpected query: {}", other),
        };
        state.queries.push(name.to_string());
        Self::check_failure(&state)?;

        let key = (
            param(params, "database").to_string(),
            param(params, "table").to_string(),
        );
        let Some(table) = state.tables.get(&key).cloned() else {
            return Ok(Vec::new());
        };
        if name == "engine" && state.vanish_after_engine {
            state.tables.remove(&key);
        }

        Ok(match name {
            "engine" => vec![row(json!({ "engine": table.engine }))],
            "columns" => table
                .columns
                .iter()
                .map(|(name, data_type, comment)| {
                    row(json!({ "name": name, "type": data_type, "comment": comment }))
                })
                .collect(),
            _ => vec![row(json!({ "sorting_key": table.sorting_key }))],
        })
    }
}
