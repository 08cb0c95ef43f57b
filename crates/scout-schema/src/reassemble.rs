//! Reassembly of fragmented table definitions.
//!
//! Large tables are stored as a `TABLE` fragment (static metadata) plus one
//! or more `TABLE_COLUMNS` fragments (column lists), all sharing the same
//! `meta.name`. Reassembly merges them back into complete
//! [`TableDescriptor`]s; entries that never receive both a `TABLE` fragment
//! and a column list are dropped, not reported as errors.

use crate::fragment::{ColumnDescriptor, FragmentContent, TableDescriptor};
use scout_core::SchemaDocument;
use std::collections::HashMap;

#[derive(Default)]
struct PartialTable {
    name: Option<String>,
    comment: String,
    /// Whether a `TABLE` fragment supplied the type tag
    tagged: bool,
    columns: Option<Vec<ColumnDescriptor>>,
}

/// Merge schema fragments into complete table descriptors.
///
/// The merge is keyed by `meta.name`, result order follows first-seen name
/// order, and arrival order does not matter for the merged result except
/// that later `TABLE` fragments never overwrite already-present columns.
/// Metric and view fragments are self-contained and not reassembled here.
pub fn reassemble(documents: &[SchemaDocument]) -> Vec<TableDescriptor> {
    let mut order: Vec<String> = Vec::new();
    let mut partials: HashMap<String, PartialTable> = HashMap::new();

    for document in documents {
        let Some(content) = FragmentContent::decode(document) else {
            continue;
        };

        let key = document.meta.name.clone();

        match content {
            FragmentContent::Table(table) => {
                let entry = partials.entry(key.clone()).or_insert_with(|| {
                    order.push(key.clone());
                    PartialTable::default()
                });
                entry.tagged = true;
                entry.name = Some(table.name);
                entry.comment = table.comment;
                // Columns accumulated so far win over whatever a later
                // TABLE fragment carries.
                if entry.columns.is_none() {
                    if let Some(columns) = table.columns {
                        entry.columns = Some(columns);
                    }
                }
            }
            FragmentContent::TableColumns(fragment) => {
                let entry = partials.entry(key.clone()).or_insert_with(|| {
                    order.push(key.clone());
                    PartialTable::default()
                });
                entry
                    .columns
                    .get_or_insert_with(Vec::new)
                    .extend(fragment.columns);
            }
            // Self-contained kinds; handled directly from the raw
            // documents by the budget evaluator and the assembler.
            FragmentContent::Metric(_) | FragmentContent::View(_) => {}
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let partial = partials.remove(&key)?;
            let (true, Some(columns)) = (partial.tagged, partial.columns) else {
                tracing::debug!(table = %key, "dropping incomplete table descriptor");
                return None;
            };
            Some(TableDescriptor {
                name: partial.name.unwrap_or(key),
                comment: partial.comment,
                columns,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::DocumentMeta;

    fn doc(name: &str, content: &str) -> SchemaDocument {
        SchemaDocument::new(
            content,
            DocumentMeta {
                name: name.to_string(),
                kind: "TABLE_SCHEMA".to_string(),
                project_id: None,
            },
        )
    }

    fn orders_table() -> SchemaDocument {
        doc("orders", r#"{"type": "TABLE", "name": "orders", "comment": ""}"#)
    }

    fn orders_columns() -> SchemaDocument {
        doc(
            "orders",
            r#"{"type": "TABLE_COLUMNS", "columns": [
                {"name": "id", "data_type": "integer"},
                {"name": "amt", "data_type": "unknown"}
            ]}"#,
        )
    }

    #[test]
    fn test_fragments_merge_into_one_descriptor() {
        let tables = reassemble(&[orders_table(), orders_columns()]);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "orders");
        // unknown-typed column survives reassembly; only DDL emission drops it
        assert_eq!(tables[0].columns.len(), 2);
        assert_eq!(tables[0].columns[1].name, "amt");
    }

    #[test]
    fn test_merge_is_order_independent() {
        let forward = reassemble(&[orders_table(), orders_columns()]);
        let reversed = reassemble(&[orders_columns(), orders_table()]);

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_column_fragments_append() {
        let extra = doc(
            "orders",
            r#"{"type": "TABLE_COLUMNS", "columns": [
                {"name": "created_at", "data_type": "timestamp"}
            ]}"#,
        );
        let tables = reassemble(&[orders_table(), orders_columns(), extra]);

        assert_eq!(tables[0].columns.len(), 3);
        assert_eq!(tables[0].columns[2].name, "created_at");
    }

    #[test]
    fn test_later_table_fragment_keeps_columns() {
        let relabelled = doc(
            "orders",
            r#"{"type": "TABLE", "name": "orders", "comment": "-- facts\n"}"#,
        );
        let tables = reassemble(&[orders_table(), orders_columns(), relabelled]);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].comment, "-- facts\n");
        assert_eq!(tables[0].columns.len(), 2);
    }

    #[test]
    fn test_incomplete_entries_are_dropped() {
        // a TABLE fragment with no columns counterpart, and columns with no
        // TABLE fragment
        let dangling_columns = doc(
            "customers",
            r#"{"type": "TABLE_COLUMNS", "columns": [{"name": "id", "data_type": "integer"}]}"#,
        );
        let tables = reassemble(&[orders_table(), dangling_columns]);

        assert!(tables.is_empty());
    }

    #[test]
    fn test_malformed_fragment_is_skipped() {
        let malformed = doc("orders", "{truncated");
        let tables = reassemble(&[orders_table(), malformed, orders_columns()]);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns.len(), 2);
    }

    #[test]
    fn test_output_follows_first_seen_order() {
        let customers_table =
            doc("customers", r#"{"type": "TABLE", "name": "customers", "comment": ""}"#);
        let customers_columns = doc(
            "customers",
            r#"{"type": "TABLE_COLUMNS", "columns": [{"name": "id", "data_type": "integer"}]}"#,
        );

        let tables = reassemble(&[
            customers_columns,
            orders_table(),
            orders_columns(),
            customers_table,
        ]);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "customers");
        assert_eq!(tables[1].name, "orders");
    }

    #[test]
    fn test_unfragmented_table_with_inline_columns() {
        let inline = doc(
            "events",
            r#"{"type": "TABLE", "name": "events", "comment": "",
                "columns": [{"name": "id", "data_type": "integer"}]}"#,
        );
        let tables = reassemble(&[inline]);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].columns.len(), 1);
    }
}
