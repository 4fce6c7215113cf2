//! Utilities for clickhouse_schema

pub mod logging;

pub use logging::init_logging;
