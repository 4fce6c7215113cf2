//! DDL generator
//!
//! Turns a declared table into the `CREATE TABLE` / `DROP TABLE` statements
//! executed by the reconciler.
//!
//! Identifiers and comments are emitted verbatim: nothing is quoted or
//! escaped, so names and comments must not contain `'`.

use crate::schema::types::{Column, DesiredTable};

/// Generate the `CREATE TABLE` statement for a table.
///
/// A table without a database lands in `default_database`. Columns keep
/// their declared order. `ORDER BY` is emitted whenever the table declares
/// one, whatever the engine.
pub fn create_table_sql(table: &DesiredTable, default_database: &str) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", table.id(default_database));

    let column_defs: Vec<String> = table.columns.iter().map(column_definition).collect();
    sql.push_str(&column_defs.join(",\n"));

    sql.push_str(&format!("\n) ENGINE = {}", table.engine));

    if !table.order_by.is_empty() {
        sql.push_str(&format!("\nORDER BY ({})", table.order_by.join(", ")));
    }

    sql
}

/// Generate the `DROP TABLE` statement for a table.
pub fn drop_table_sql(table: &DesiredTable, default_database: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", table.id(default_database))
}

fn column_definition(column: &Column) -> String {
    match &column.comment {
        Some(comment) => format!("    {} {} COMMENT '{}'", column.name, column.data_type, comment),
        None => format!("    {} {}", column.name, column.data_type),
    }
}
