//! ClickHouse connection handling
//!
//! Talks to the ClickHouse HTTP interface. Statements go in the request body,
//! query parameters travel as `param_<name>` URL parameters.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Map, Value};

use crate::config::ClickHouseConfig;
use crate::db::client::{ClientError, DataAccess, Params, Row};

/// HTTP client for a single ClickHouse server
#[derive(Debug, Clone)]
pub struct ClickHouseClient {
    http: Client,
    base_url: Url,
    username: String,
    password: String,
    database: String,
    max_execution_time: Option<u64>,
}

impl ClickHouseClient {
    /// Build a client from configuration without contacting the server
    pub fn new(config: &ClickHouseConfig) -> Result<Self, ClientError> {
        let scheme = if config.secure { "https" } else { "http" };
        let base_url = Url::parse(&format!("{}://{}:{}/", scheme, config.host, config.port))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}:{}: {}", config.host, config.port, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            max_execution_time: config.max_execution_time,
        })
    }

    /// Build a client and check that the server answers
    pub async fn connect(config: &ClickHouseConfig) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        client.ping().await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            username = %config.username,
            database = %config.database,
            "Connected to ClickHouse"
        );

        Ok(client)
    }

    /// `GET /ping`
    pub async fn ping(&self) -> Result<(), ClientError> {
        let url = self
            .base_url
            .join("ping")
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;
        let response = self.http.get(url).send().await?;
        Self::check(response).await.map(|_| ())
    }

    /// URL for one statement: session database, settings and bound parameters
    fn statement_url(&self, params: &Params<'_>, format: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("database", &self.database);
            if let Some(seconds) = self.max_execution_time {
                pairs.append_pair("max_execution_time", &seconds.to_string());
            }
            if let Some(format) = format {
                pairs.append_pair("default_format", format);
            }
            for (name, value) in params {
                pairs.append_pair(&format!("param_{}", name), value);
            }
        }
        url
    }

    async fn send(&self, sql: &str, params: &Params<'_>, format: Option<&str>) -> Result<String, ClientError> {
        tracing::debug!(sql = sql, "Sending statement to ClickHouse");

        let response = self
            .http
            .post(self.statement_url(params, format))
            .header("X-ClickHouse-User", &self.username)
            .header("X-ClickHouse-Key", &self.password)
            .body(sql.to_string())
            .send()
            .await?;

        Self::check(response).await
    }

    async fn check(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl DataAccess for ClickHouseClient {
    async fn execute(&self, sql: &str) -> Result<(), ClientError> {
        self.send(sql, &[], None).await.map(|_| ())
    }

    async fn query(&self, sql: &str, params: &Params<'_>) -> Result<Vec<Row>, ClientError> {
        let body = self.send(sql, params, Some("JSONEachRow")).await?;
        parse_json_each_row(&body)
    }
}

/// Decode a `JSONEachRow` response body, one object per line
pub fn parse_json_each_row(body: &str) -> Result<Vec<Row>, ClientError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Ok(Row::new(serde_json::from_str::<Map<String, Value>>(line)?)))
        .collect()
}
