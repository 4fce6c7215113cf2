//! Database module for clickhouse_schema
//!
//! This module defines the data-access capability and its ClickHouse
//! implementation.

pub mod client;
pub mod connection;

// Re-export key types
pub use client::{ClientError, DataAccess, Row};
pub use connection::ClickHouseClient;
