//! Configuration loading and the config-driven client

mod common;

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use clickhouse_schema::config::{self, Config};
use clickhouse_schema::{Error, SchemaClient, VerifyOutcome};
use common::{MockClient, MockTable};

const CONFIG: &str = r#"
[clickhouse]
host = "clickhouse.local"
port = 8123
username = "admin"
password = "secret"
database = "analytics"

[schema]
aggregate_mismatches = false

[logging]
level = "debug"
format = "json"
stdout = true

[[tables]]
name = "events"
engine = "MergeTree"
order_by = ["id", "ts"]

[[tables.columns]]
name = "id"
type = "UInt64"
comment = "pk"

[[tables.columns]]
name = "ts"
type = "DateTime"

[[tables]]
name = "audit"
database = "default"
engine = "Log"

[[tables.columns]]
name = "message"
type = "String"
"#;

fn write_config(contents: &str) -> (tempfile::TempDir, String) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clickhouse_schema.toml");
    fs::write(&path, contents).unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

fn load() -> Config {
    let (_dir, path) = write_config(CONFIG);
    config::load_from_file(&path).unwrap()
}

#[test]
fn loads_connection_and_tables() {
    let config = load();

    assert_eq!(config.clickhouse.host, "clickhouse.local");
    assert_eq!(config.clickhouse.username, "admin");
    assert_eq!(config.clickhouse.timeout_seconds, 30);
    assert_eq!(config.logging.as_ref().map(|l| l.format.as_str()), Some("json"));
    assert_eq!(config.tables.len(), 2);
    assert_eq!(config.tables[0].database, None);
    assert_eq!(config.tables[0].columns[0].comment.as_deref(), Some("pk"));
    assert_eq!(config.tables[0].columns[1].comment, None);
}

#[test]
fn missing_file_is_a_config_error() {
    let err = config::load_from_file("/nonexistent/clickhouse_schema.toml").unwrap_err();
    assert!(matches!(err, Error::ConfigError(_)));
}

#[test]
fn invalid_declarations_fail_to_load() {
    let (_dir, path) = write_config(
        r#"
        [[tables]]
        name = "events"
        engine = ""
        "#,
    );

    let err = config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, Error::ValidationError(_)));
}

#[test]
fn ddl_uses_connection_database_as_default() {
    let client = SchemaClient::new(load(), MockClient::new());

    assert_eq!(
        client.create_sql("analytics.events").unwrap(),
        "CREATE TABLE analytics.events (\n    id UInt64 COMMENT 'pk',\n    ts DateTime\n) ENGINE = MergeTree\nORDER BY (id, ts)"
    );
    assert!(matches!(
        client.create_sql("default.events"),
        Err(Error::ConfigError(_))
    ));
}

#[tokio::test]
async fn create_and_destroy_declared_tables() {
    let mock = MockClient::new();
    let client = SchemaClient::new(load(), mock.clone());

    let created = client.create("default.audit").await.unwrap();
    client.destroy("default.audit").await.unwrap();

    assert_eq!(created.id.to_string(), "default.audit");
    assert_eq!(
        mock.executed(),
        vec![
            "CREATE TABLE default.audit (\n    message String\n) ENGINE = Log".to_string(),
            "DROP TABLE IF EXISTS default.audit".to_string(),
        ]
    );
}

#[tokio::test]
async fn check_all_verifies_every_declaration() {
    let mock = MockClient::new().with_table(
        "analytics",
        "events",
        MockTable::new("MergeTree", "id, ts")
            .column("id", "UInt64", "pk")
            .column("ts", "DateTime", ""),
    );
    let client = SchemaClient::new(load(), mock);

    let results = client.check_all().await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0.to_string(), "analytics.events");
    assert!(matches!(results[0].1, Ok(VerifyOutcome::InSync(_))));
    assert_eq!(results[1].0.to_string(), "default.audit");
    assert!(matches!(results[1].1, Ok(VerifyOutcome::Gone)));
}

#[tokio::test]
async fn import_output_reads_back_as_declaration() {
    let mock = MockClient::new().with_table(
        "analytics",
        "sessions",
        MockTable::new("ReplacingMergeTree", "user_id")
            .column("user_id", "UInt64", "owner")
            .column("started", "DateTime", ""),
    );
    let client = SchemaClient::new(load(), mock);

    let imported = client.import("analytics.sessions").await.unwrap();
    let rendered = toml::to_string(&imported.table).unwrap();
    let parsed: clickhouse_schema::DesiredTable = toml::from_str(&rendered).unwrap();

    assert_eq!(parsed, imported.table);
    assert!(!rendered.contains("comment = \"\""));
}
