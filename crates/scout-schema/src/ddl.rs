//! DDL rendering for tables, metrics, and views.
//!
//! Pure functions, no I/O: given a descriptor (and optionally a column
//! selection from the pruning path), emit a CREATE-TABLE-like textual
//! schema representation for the SQL-generation prompt.

use crate::fragment::{MetricFragment, TableDescriptor, ViewFragment};
use std::collections::HashSet;

/// Cross-cutting flags produced while rendering one table's DDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DdlFlags {
    pub has_calculated_field: bool,
    pub has_json_field: bool,
}

/// Normalize an internal data-type tag to an engine-supported SQL type.
///
/// Unrecognized tags pass through upper-cased.
pub fn engine_data_type(data_type: &str) -> String {
    match data_type.to_ascii_lowercase().as_str() {
        "bool" | "boolean" => "BOOLEAN".to_string(),
        "tinyint" | "smallint" | "int" | "integer" => "INTEGER".to_string(),
        "long" | "bigint" => "BIGINT".to_string(),
        "float" | "real" => "REAL".to_string(),
        "double" => "DOUBLE".to_string(),
        "decimal" | "numeric" => "DECIMAL".to_string(),
        "char" | "varchar" | "string" | "text" => "VARCHAR".to_string(),
        "date" => "DATE".to_string(),
        "time" => "TIME".to_string(),
        "timestamp" | "datetime" => "TIMESTAMP".to_string(),
        "timestamptz" => "TIMESTAMP WITH TIME ZONE".to_string(),
        "interval" => "INTERVAL".to_string(),
        "json" => "JSON".to_string(),
        "uuid" => "UUID".to_string(),
        "bytea" | "binary" => "BYTEA".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

/// Render one table's CREATE TABLE statement.
///
/// When `selection` is supplied (the pruning path), only columns whose name
/// matches an entry exactly are emitted; `selected_tables` is then the full
/// set of table names chosen by the pruning selection, used to validate
/// calculated-field cross-references. A selected calculated column is
/// emitted only when every table it references is itself selected.
///
/// Columns with an unknown data type are never emitted, selection or not.
pub fn build_table_ddl(
    table: &TableDescriptor,
    selection: Option<&HashSet<String>>,
    selected_tables: Option<&HashSet<String>>,
) -> (String, DdlFlags) {
    let mut flags = DdlFlags::default();
    let mut columns_ddl = Vec::with_capacity(table.columns.len());

    for column in &table.columns {
        if column.is_unknown_type() {
            continue;
        }

        if let Some(selection) = selection {
            if !selection.contains(&column.name) {
                continue;
            }
        }

        if column.is_calculated {
            if let Some(selected_tables) = selected_tables {
                if column
                    .referenced_tables
                    .iter()
                    .any(|referenced| !selected_tables.contains(referenced))
                {
                    continue;
                }
            }
            flags.has_calculated_field = true;
        }

        if column.is_json_type() {
            flags.has_json_field = true;
        }

        columns_ddl.push(format!(
            "{}{} {}",
            column.comment,
            column.name,
            engine_data_type(&column.data_type)
        ));
    }

    let ddl = format!(
        "{}CREATE TABLE {} (\n  {}\n);",
        table.comment,
        table.name,
        columns_ddl.join(",\n  ")
    );

    (ddl, flags)
}

/// Render a metric's CREATE TABLE statement. Metrics are self-contained;
/// no column pruning applies.
pub fn build_metric_ddl(metric: &MetricFragment) -> String {
    let columns_ddl: Vec<String> = metric
        .columns
        .iter()
        .filter(|column| !column.is_unknown_type())
        .map(|column| {
            format!(
                "{}{} {}",
                column.comment,
                column.name,
                engine_data_type(&column.data_type)
            )
        })
        .collect();

    format!(
        "{}CREATE TABLE {} (\n  {}\n);",
        metric.comment,
        metric.name,
        columns_ddl.join(",\n  ")
    )
}

/// Render a view's CREATE VIEW statement. The statement is opaque SQL; no
/// column pruning applies.
pub fn build_view_ddl(view: &ViewFragment) -> String {
    format!("{}CREATE VIEW {}\nAS {}", view.comment, view.name, view.statement)
}
