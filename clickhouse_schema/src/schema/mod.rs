//! Schema module for clickhouse_schema
//!
//! This module reads live table metadata, compares it with declarations and
//! generates DDL.

pub mod analyzer;
pub mod diff;
pub mod generator;
pub mod types;

// Re-export key types
pub use analyzer::{parse_sorting_key, MetadataReader};
pub use diff::{EngineFamily, Mismatch, MismatchKind, MismatchReport, SchemaComparator};
pub use generator::{create_table_sql, drop_table_sql};
pub use types::{ActualColumn, ActualTable, Column, DesiredTable, TableId};
