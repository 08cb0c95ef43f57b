//! Token-budget evaluation of the unpruned candidate schema.

use crate::tokenizer::TokenCounter;
use scout_core::SchemaDocument;
use scout_schema::{
    build_metric_ddl, build_table_ddl, build_view_ddl, FragmentContent, TableDescriptor,
};
use serde::{Deserialize, Serialize};

/// One selected table/metric/view with its prompt-ready DDL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub table_name: String,
    pub table_ddl: String,
}

/// Cross-cutting flags, OR-reduced over everything included in a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateFlags {
    pub has_calculated_field: bool,
    pub has_metric: bool,
    pub has_json_field: bool,
}

/// Outcome of the budget check on the unpruned candidate schema.
///
/// When pruning is required, `candidate_results` is empty (the signal the
/// assembler consumes) while `token_count` and `flags` still describe the
/// unpruned candidate set, for caller-side metadata.
#[derive(Debug, Clone)]
pub struct BudgetEvaluation {
    pub candidate_results: Vec<RetrievalResult>,
    pub token_count: usize,
    pub flags: AggregateFlags,
    pub pruning_required: bool,
}

/// Build DDL for the full unpruned candidate set and decide whether the
/// schema fits the model's context window.
///
/// Tables come from the reassembled descriptors; metrics and views are
/// self-contained per fragment and are scanned directly from the raw
/// documents.
pub fn evaluate_budget(
    tables: &[TableDescriptor],
    documents: &[SchemaDocument],
    counter: &TokenCounter,
    context_window_size: usize,
    enable_column_pruning: bool,
) -> BudgetEvaluation {
    let mut candidate_results = Vec::new();
    let mut flags = AggregateFlags::default();

    for table in tables {
        let (ddl, table_flags) = build_table_ddl(table, None, None);
        flags.has_calculated_field |= table_flags.has_calculated_field;
        flags.has_json_field |= table_flags.has_json_field;
        candidate_results.push(RetrievalResult {
            table_name: table.name.clone(),
            table_ddl: ddl,
        });
    }

    for document in documents {
        match FragmentContent::decode(document) {
            Some(FragmentContent::Metric(metric)) => {
                candidate_results.push(RetrievalResult {
                    table_name: metric.name.clone(),
                    table_ddl: build_metric_ddl(&metric),
                });
                flags.has_metric = true;
            }
            Some(FragmentContent::View(view)) => {
                candidate_results.push(RetrievalResult {
                    table_name: view.name.clone(),
                    table_ddl: build_view_ddl(&view),
                });
            }
            _ => {}
        }
    }

    let joined: Vec<&str> = candidate_results
        .iter()
        .map(|result| result.table_ddl.as_str())
        .collect();
    let token_count = counter.count(&joined.join(" "));

    let pruning_required = token_count > context_window_size || enable_column_pruning;
    if pruning_required {
        tracing::debug!(
            token_count,
            context_window_size,
            enable_column_pruning,
            "schema does not pass the budget check, column pruning required"
        );
        candidate_results.clear();
    }

    BudgetEvaluation {
        candidate_results,
        token_count,
        flags,
        pruning_required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{DocumentMeta, SchemaDocument};
    use scout_schema::ColumnDescriptor;

    fn counter() -> TokenCounter {
        TokenCounter::for_model("gpt-4o-mini").unwrap()
    }

    fn table(name: &str) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            comment: String::new(),
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                comment: String::new(),
                is_calculated: false,
                is_json_field: false,
                referenced_tables: vec![],
            }],
        }
    }

    fn metric_doc() -> SchemaDocument {
        SchemaDocument::new(
            r#"{"type": "METRIC", "name": "revenue", "comment": "",
                "columns": [{"name": "total", "data_type": "double"}]}"#,
            DocumentMeta {
                name: "revenue".to_string(),
                kind: "TABLE_SCHEMA".to_string(),
                project_id: None,
            },
        )
    }

    #[test]
    fn test_under_budget_returns_full_candidates() {
        let tables = vec![table("orders"), table("customers")];
        let evaluation = evaluate_budget(&tables, &[], &counter(), 100_000, false);

        assert!(!evaluation.pruning_required);
        assert_eq!(evaluation.candidate_results.len(), 2);
        assert!(evaluation.token_count > 0);
        assert_eq!(evaluation.candidate_results[0].table_name, "orders");
    }

    #[test]
    fn test_over_budget_signals_pruning() {
        let tables = vec![table("orders")];
        let evaluation = evaluate_budget(&tables, &[], &counter(), 1, false);

        assert!(evaluation.pruning_required);
        assert!(evaluation.candidate_results.is_empty());
        // token count and flags still describe the unpruned set
        assert!(evaluation.token_count > 1);
    }

    #[test]
    fn test_forced_pruning_signals_even_under_budget() {
        let tables = vec![table("orders")];
        let evaluation = evaluate_budget(&tables, &[], &counter(), 100_000, true);

        assert!(evaluation.pruning_required);
        assert!(evaluation.candidate_results.is_empty());
    }

    #[test]
    fn test_budget_decision_is_monotone_in_window_size() {
        let counter = counter();
        let tables = vec![table("orders"), table("customers")];
        let evaluation = evaluate_budget(&tables, &[], &counter, 0, false);
        let token_count = evaluation.token_count;
        assert!(evaluation.pruning_required);

        let mut required_seen = true;
        for window in 0..=token_count + 4 {
            let required =
                evaluate_budget(&tables, &[], &counter, window, false).pruning_required;
            // once the window is large enough, the decision never flips back
            assert!(required_seen || !required);
            required_seen = required;
        }
        assert!(!required_seen);
    }

    #[test]
    fn test_metric_documents_join_candidates_and_set_flag() {
        let tables = vec![table("orders")];
        let evaluation = evaluate_budget(&tables, &[metric_doc()], &counter(), 100_000, false);

        assert_eq!(evaluation.candidate_results.len(), 2);
        assert_eq!(evaluation.candidate_results[1].table_name, "revenue");
        assert!(evaluation.flags.has_metric);
    }

    #[test]
    fn test_empty_schema_counts_zero_tokens() {
        let evaluation = evaluate_budget(&[], &[], &counter(), 100, false);
        assert_eq!(evaluation.token_count, 0);
        assert!(!evaluation.pruning_required);
        assert!(evaluation.candidate_results.is_empty());
    }
}
