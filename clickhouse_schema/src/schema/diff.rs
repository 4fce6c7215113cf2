//! Schema comparison
//!
//! This module compares a declared table against the table observed in
//! ClickHouse and reports where they diverge.

use std::fmt;

use crate::schema::types::{ActualTable, DesiredTable, TableId};

/// Engines whose on-disk layout is sorted by the declared `ORDER BY` key
pub const DEFAULT_ORDERED_ENGINES: &[&str] = &[
    "MergeTree",
    "ReplacingMergeTree",
    "SummingMergeTree",
    "AggregatingMergeTree",
    "CollapsingMergeTree",
    "VersionedCollapsingMergeTree",
    "GraphiteMergeTree",
];

/// Prefix set deciding which engines belong to the ordered-storage family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFamily {
    prefixes: Vec<String>,
}

impl EngineFamily {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `engine` starts with one of the family prefixes
    pub fn is_ordered(&self, engine: &str) -> bool {
        self.prefixes.iter().any(|prefix| engine.starts_with(prefix.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for EngineFamily {
    fn default() -> Self {
        Self::new(DEFAULT_ORDERED_ENGINES.iter().copied())
    }
}

/// Category of a divergence, one per verification step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    Engine,
    ColumnCount,
    Column,
    OrderBy,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MismatchKind::Engine => "Table engine mismatch",
            MismatchKind::ColumnCount => "Table column count mismatch",
            MismatchKind::Column => "Table schema mismatch",
            MismatchKind::OrderBy => "Table ORDER BY mismatch",
        };
        f.write_str(label)
    }
}

/// A single divergence between declared and observed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Engine {
        expected: String,
        actual: String,
    },
    ColumnCount {
        expected: usize,
        actual: usize,
    },
    MissingColumn {
        column: String,
    },
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },
    ColumnComment {
        column: String,
        expected: String,
        actual: String,
    },
    OrderByLength {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// `position` is 1-based
    OrderByColumn {
        position: usize,
        expected: String,
        actual: String,
    },
}

impl Mismatch {
    pub fn kind(&self) -> MismatchKind {
        match self {
            Mismatch::Engine { .. } => MismatchKind::Engine,
            Mismatch::ColumnCount { .. } => MismatchKind::ColumnCount,
            Mismatch::MissingColumn { .. }
            | Mismatch::ColumnType { .. }
            | Mismatch::ColumnComment { .. } => MismatchKind::Column,
            Mismatch::OrderByLength { .. } | Mismatch::OrderByColumn { .. } => {
                MismatchKind::OrderBy
            }
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Engine { expected, actual } => write!(
                f,
                "expected engine '{}', but table has engine '{}'",
                expected, actual
            ),
            Mismatch::ColumnCount { expected, actual } => write!(
                f,
                "expected {} columns, found {} columns",
                expected, actual
            ),
            Mismatch::MissingColumn { column } => {
                write!(f, "column '{}' not found in table", column)
            }
            Mismatch::ColumnType {
                column,
                expected,
                actual,
            } => write!(
                f,
                "column '{}': expected type '{}', found type '{}'",
                column, expected, actual
            ),
            Mismatch::ColumnComment {
                column,
                expected,
                actual,
            } => write!(
                f,
                "column '{}': expected comment '{}', found comment '{}'",
                column, expected, actual
            ),
            Mismatch::OrderByLength { expected, actual } => write!(
                f,
                "expected ORDER BY with {} columns ({}), found {} columns ({})",
                expected.len(),
                expected.join(", "),
                actual.len(),
                actual.join(", ")
            ),
            Mismatch::OrderByColumn {
                position,
                expected,
                actual,
            } => write!(
                f,
                "ORDER BY column {}: expected '{}', found '{}'",
                position, expected, actual
            ),
        }
    }
}

/// One or more divergences found for a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchReport {
    pub table: TableId,
    pub mismatches: Vec<Mismatch>,
}

impl MismatchReport {
    /// Categories present in the report, in the order they were found
    pub fn kinds(&self) -> Vec<MismatchKind> {
        let mut kinds = Vec::new();
        for mismatch in &self.mismatches {
            let kind = mismatch.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

impl fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self
            .mismatches
            .iter()
            .map(|m| format!("{}: {}", m.kind(), m))
            .collect();
        write!(f, "table {} does not match configuration: {}", self.table, details.join("; "))
    }
}

impl std::error::Error for MismatchReport {}

/// Compares declared tables against observed ones
#[derive(Debug, Clone, Default)]
pub struct SchemaComparator {
    family: EngineFamily,
}

impl SchemaComparator {
    pub fn new(family: EngineFamily) -> Self {
        Self { family }
    }

    pub fn family(&self) -> &EngineFamily {
        &self.family
    }

    /// Compare and stop at the first category that diverges
    pub fn compare(
        &self,
        desired: &DesiredTable,
        actual: &ActualTable,
    ) -> Result<(), MismatchReport> {
        let mut mismatches = Vec::new();
        self.collect(desired, actual, true, &mut mismatches);
        self.report(actual, mismatches)
    }

    /// Compare and report every divergence found
    pub fn compare_all(
        &self,
        desired: &DesiredTable,
        actual: &ActualTable,
    ) -> Result<(), MismatchReport> {
        let mut mismatches = Vec::new();
        self.collect(desired, actual, false, &mut mismatches);
        self.report(actual, mismatches)
    }

    fn report(&self, actual: &ActualTable, mismatches: Vec<Mismatch>) -> Result<(), MismatchReport> {
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(MismatchReport {
                table: actual.id.clone(),
                mismatches,
            })
        }
    }

    fn collect(
        &self,
        desired: &DesiredTable,
        actual: &ActualTable,
        fail_fast: bool,
        out: &mut Vec<Mismatch>,
    ) {
        if desired.engine != actual.engine {
            out.push(Mismatch::Engine {
                expected: desired.engine.clone(),
                actual: actual.engine.clone(),
            });
            if fail_fast {
                return;
            }
        }

        let before = out.len();
        Self::compare_columns(desired, actual, fail_fast, out);
        if fail_fast && out.len() > before {
            return;
        }

        if self.family.is_ordered(&actual.engine) {
            Self::compare_order_by(&desired.order_by, &actual.order_by, out);
        }
    }

    fn compare_columns(
        desired: &DesiredTable,
        actual: &ActualTable,
        fail_fast: bool,
        out: &mut Vec<Mismatch>,
    ) {
        if desired.columns.len() != actual.columns.len() {
            out.push(Mismatch::ColumnCount {
                expected: desired.columns.len(),
                actual: actual.columns.len(),
            });
            if fail_fast {
                return;
            }
        }

        for expected in &desired.columns {
            let Some(found) = actual.columns.get(&expected.name) else {
                out.push(Mismatch::MissingColumn {
                    column: expected.name.clone(),
                });
                if fail_fast {
                    return;
                }
                continue;
            };

            if found.data_type != expected.data_type {
                out.push(Mismatch::ColumnType {
                    column: expected.name.clone(),
                    expected: expected.data_type.clone(),
                    actual: found.data_type.clone(),
                });
                if fail_fast {
                    return;
                }
            }

            // No declared comment and an empty comment are the same thing here.
            let expected_comment = expected.comment.as_deref().unwrap_or("");
            if found.comment != expected_comment {
                out.push(Mismatch::ColumnComment {
                    column: expected.name.clone(),
                    expected: expected_comment.to_string(),
                    actual: found.comment.clone(),
                });
                if fail_fast {
                    return;
                }
            }
        }
    }

    fn compare_order_by(expected: &[String], actual: &[String], out: &mut Vec<Mismatch>) {
        if expected.len() != actual.len() {
            out.push(Mismatch::OrderByLength {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
            return;
        }

        if let Some((i, (e, a))) = expected
            .iter()
            .zip(actual)
            .enumerate()
            .find(|(_, (e, a))| e != a)
        {
            out.push(Mismatch::OrderByColumn {
                position: i + 1,
                expected: e.clone(),
                actual: a.clone(),
            });
        }
    }
}
