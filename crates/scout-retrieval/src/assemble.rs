//! Final assembly of retrieval results.

use crate::budget::{AggregateFlags, BudgetEvaluation, RetrievalResult};
use crate::pruning::PruningSelection;
use scout_core::SchemaDocument;
use scout_schema::{build_metric_ddl, build_table_ddl, build_view_ddl, FragmentContent, TableDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The externally observed result of one retrieval run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutput {
    pub retrieval_results: Vec<RetrievalResult>,
    pub has_calculated_field: bool,
    pub has_metric: bool,
    pub has_json_field: bool,
}

impl RetrievalOutput {
    fn from_parts(retrieval_results: Vec<RetrievalResult>, flags: AggregateFlags) -> Self {
        Self {
            retrieval_results,
            has_calculated_field: flags.has_calculated_field,
            has_metric: flags.has_metric,
            has_json_field: flags.has_json_field,
        }
    }
}

/// Produce the final retrieval results.
///
/// Without a pruning selection, the budget evaluator's candidate set and
/// flags pass through unchanged. With one, DDL is rebuilt per selected
/// table restricted to its chosen columns, metrics and views named by the
/// selection are rebuilt unconditionally, and the flags are re-OR-reduced
/// over what is actually included. Tables the selection names but the
/// descriptor map does not contain are ignored; the model may hallucinate.
pub fn assemble(
    evaluation: BudgetEvaluation,
    selection: Option<&PruningSelection>,
    tables: &[TableDescriptor],
    documents: &[SchemaDocument],
) -> RetrievalOutput {
    let Some(selection) = selection else {
        return RetrievalOutput::from_parts(evaluation.candidate_results, evaluation.flags);
    };

    let selected_tables = selection.table_names();
    let mut retrieval_results = Vec::new();
    let mut flags = AggregateFlags::default();
    let mut known: HashSet<&str> = HashSet::new();

    for table in tables {
        known.insert(table.name.as_str());
        let Some(contents) = selection.get(&table.name) else {
            continue;
        };

        let columns: HashSet<String> = contents.columns.iter().cloned().collect();
        let (ddl, table_flags) = build_table_ddl(table, Some(&columns), Some(&selected_tables));
        flags.has_calculated_field |= table_flags.has_calculated_field;
        flags.has_json_field |= table_flags.has_json_field;
        retrieval_results.push(RetrievalResult {
            table_name: table.name.clone(),
            table_ddl: ddl,
        });
    }

    for document in documents {
        if !selection.contains(&document.meta.name) {
            continue;
        }
        match FragmentContent::decode(document) {
            Some(FragmentContent::Metric(metric)) => {
                known.insert(document.meta.name.as_str());
                retrieval_results.push(RetrievalResult {
                    table_name: metric.name.clone(),
                    table_ddl: build_metric_ddl(&metric),
                });
                flags.has_metric = true;
            }
            Some(FragmentContent::View(view)) => {
                known.insert(document.meta.name.as_str());
                retrieval_results.push(RetrievalResult {
                    table_name: view.name.clone(),
                    table_ddl: build_view_ddl(&view),
                });
            }
            _ => {}
        }
    }

    for name in &selected_tables {
        if !known.contains(name.as_str()) {
            tracing::warn!(table = %name, "pruning selection references a table absent from the schema");
        }
    }

    RetrievalOutput::from_parts(retrieval_results, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pruning::ColumnSelection;
    use scout_core::DocumentMeta;
    use scout_schema::ColumnDescriptor;

    fn column(name: &str, data_type: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            data_type: data_type.to_string(),
            comment: String::new(),
            is_calculated: false,
            is_json_field: false,
            referenced_tables: vec![],
        }
    }

    fn table(name: &str, columns: Vec<ColumnDescriptor>) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            comment: String::new(),
            columns,
        }
    }

    fn evaluation(candidates: Vec<RetrievalResult>, flags: AggregateFlags) -> BudgetEvaluation {
        BudgetEvaluation {
            candidate_results: candidates,
            token_count: 42,
            flags,
            pruning_required: false,
        }
    }

    fn selection_of(table_name: &str, columns: &[&str]) -> PruningSelection {
        let mut selection = PruningSelection::new();
        selection.insert(
            table_name,
            ColumnSelection {
                chain_of_thought_reasoning: columns.iter().map(|c| format!("needs {c}")).collect(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
        );
        selection
    }

    #[test]
    fn test_unpruned_path_passes_through() {
        let candidates = vec![RetrievalResult {
            table_name: "orders".to_string(),
            table_ddl: "CREATE TABLE orders (\n  id INTEGER\n);".to_string(),
        }];
        let flags = AggregateFlags {
            has_metric: true,
            ..Default::default()
        };

        let output = assemble(evaluation(candidates.clone(), flags), None, &[], &[]);
        assert_eq!(output.retrieval_results, candidates);
        assert!(output.has_metric);
        assert!(!output.has_json_field);
    }

    #[test]
    fn test_pruned_path_restricts_tables_and_columns() {
        let tables = vec![
            table("orders", vec![column("id", "integer"), column("amount", "double")]),
            table("customers", vec![column("id", "integer")]),
        ];
        let selection = selection_of("orders", &["id"]);

        let output = assemble(
            evaluation(vec![], AggregateFlags::default()),
            Some(&selection),
            &tables,
            &[],
        );

        assert_eq!(output.retrieval_results.len(), 1);
        assert_eq!(output.retrieval_results[0].table_name, "orders");
        assert!(output.retrieval_results[0].table_ddl.contains("id INTEGER"));
        assert!(!output.retrieval_results[0].table_ddl.contains("amount"));
    }

    #[test]
    fn test_hallucinated_tables_are_ignored() {
        let tables = vec![table("orders", vec![column("id", "integer")])];
        let selection = selection_of("no_such_table", &["id"]);

        let output = assemble(
            evaluation(vec![], AggregateFlags::default()),
            Some(&selection),
            &tables,
            &[],
        );

        assert!(output.retrieval_results.is_empty());
    }

    #[test]
    fn test_pruned_flags_recomputed_independently() {
        // pre-pruning flags say json was present; the pruned set excludes it
        let tables = vec![table(
            "orders",
            vec![column("id", "integer"), column("payload", "json")],
        )];
        let selection = selection_of("orders", &["id"]);
        let pre_flags = AggregateFlags {
            has_json_field: true,
            ..Default::default()
        };

        let output = assemble(evaluation(vec![], pre_flags), Some(&selection), &tables, &[]);
        assert!(!output.has_json_field);
    }

    #[test]
    fn test_selected_metric_rebuilt_without_pruning() {
        let metric = SchemaDocument::new(
            r#"{"type": "METRIC", "name": "revenue", "comment": "",
                "columns": [{"name": "total", "data_type": "double"}]}"#,
            DocumentMeta {
                name: "revenue".to_string(),
                kind: "TABLE_SCHEMA".to_string(),
                project_id: None,
            },
        );
        let selection = selection_of("revenue", &[]);

        let output = assemble(
            evaluation(vec![], AggregateFlags::default()),
            Some(&selection),
            &[],
            &[metric],
        );

        assert_eq!(output.retrieval_results.len(), 1);
        assert!(output.retrieval_results[0].table_ddl.contains("total DOUBLE"));
        assert!(output.has_metric);
    }
}
