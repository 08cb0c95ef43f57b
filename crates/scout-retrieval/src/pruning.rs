//! Column pruning via one structured LLM call.
//!
//! When the unpruned schema does not pass the budget check, the full DDL
//! set plus the user's question (and prior history) are rendered into a
//! single instruction prompt demanding strict JSON output: one entry per
//! selected table with the chosen column names and a chain-of-thought
//! reasoning list. The reply is parsed once into a [`PruningSelection`]
//! keyed by table name; a reply that does not conform is a pipeline
//! failure, never retried here.

use scout_core::{Error, Result, StructuredGenerator};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// System instruction for the column-selection call.
pub const COLUMN_SELECTION_SYSTEM_PROMPT: &str = r#"### TASK ###
You are a highly skilled data analyst. Your goal is to examine the provided database schema, interpret the posed question, and identify the specific columns from the relevant tables required to construct an accurate SQL query.

The database schema includes tables, columns, primary keys, foreign keys, relationships, and any relevant constraints.

### INSTRUCTIONS ###
1. Carefully analyze the schema and identify the essential tables and columns needed to answer the question.
2. For each table, provide a clear and concise reasoning for why specific columns are selected.
3. List each reason as part of a step-by-step chain of thought, justifying the inclusion of each column.
4. If a "." is included in columns, put the name before the first dot into chosen columns.
5. The number of columns chosen must match the number of reasoning.
6. Final chosen columns must be only column names, don't prefix it with table names.
7. If the chosen column is a child column of a STRUCT type column, choose the parent column instead of the child column.

### FINAL ANSWER FORMAT ###
Please provide your response as a JSON object, structured as follows:

{
    "results": [
        {
            "table_selection_reason": "Reason for selecting tablename1",
            "table_contents": {
              "chain_of_thought_reasoning": [
                  "Reason 1 for selecting column1",
                  "Reason 2 for selecting column2",
                  ...
              ],
              "columns": ["column1", "column2", ...]
            },
            "table_name":"tablename1"
        },
        ...
    ]
}

### ADDITIONAL NOTES ###
- Each table key must list only the columns relevant to answering the question.
- Provide a reasoning list (`chain_of_thought_reasoning`) for each table, explaining why each column is necessary.
- Provide the reason of selecting the table in (`table_selection_reason`) for each table.
- Be logical, concise, and ensure the output strictly follows the required JSON format.
- Use table name used in the "Create Table" statement, don't use "alias".
- Match Column names with the definition in the "Create Table" statement.
- Match Table names with the definition in the "Create Table" statement.
"#;

/// Per-table selection: chosen columns with a parallel reasoning list.
///
/// The instructions call for equal lengths, but that is a contract with the
/// model, not an enforced invariant; a mismatched reply is accepted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSelection {
    pub chain_of_thought_reasoning: Vec<String>,
    pub columns: Vec<String>,
}

/// One table entry in the structured reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectedTable {
    pub table_name: String,
    pub table_contents: ColumnSelection,
    pub table_selection_reason: String,
}

/// Wire shape of the structured reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSelectionResponse {
    pub results: Vec<SelectedTable>,
}

/// JSON schema the generation call is constrained to.
pub fn response_schema() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(schemars::schema_for!(
        ColumnSelectionResponse
    ))?)
}

/// The parsed pruning selection, keyed by table name for O(1) lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PruningSelection {
    selected: HashMap<String, ColumnSelection>,
}

impl PruningSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw reply into a selection.
    ///
    /// A reply that is not valid JSON or does not match the documented
    /// shape is a [`Error::PruningResponseInvalid`] pipeline failure.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let response: ColumnSelectionResponse = serde_json::from_str(reply)
            .map_err(|e| Error::PruningResponseInvalid(e.to_string()))?;
        Ok(Self::from(response))
    }

    pub fn insert(&mut self, table_name: impl Into<String>, selection: ColumnSelection) {
        self.selected.insert(table_name.into(), selection);
    }

    pub fn get(&self, table_name: &str) -> Option<&ColumnSelection> {
        self.selected.get(table_name)
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.selected.contains_key(table_name)
    }

    /// The full set of selected table names, needed to validate
    /// calculated-field cross-references during DDL rebuild.
    pub fn table_names(&self) -> HashSet<String> {
        self.selected.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl From<ColumnSelectionResponse> for PruningSelection {
    fn from(response: ColumnSelectionResponse) -> Self {
        let selected = response
            .results
            .into_iter()
            .map(|table| (table.table_name, table.table_contents))
            .collect();
        Self { selected }
    }
}

/// Render the column-selection user prompt from the unpruned DDL set and
/// the combined question text.
pub fn render_pruning_prompt(question: &str, db_schemas: &[String]) -> String {
    let mut prompt = String::from("### Database Schema ###\n\n");
    for db_schema in db_schemas {
        prompt.push_str(db_schema);
        prompt.push('\n');
    }
    prompt.push_str("\n### INPUT ###\n");
    prompt.push_str(question);

    clean_up_new_lines(&prompt)
}

/// Collapse runs of blank lines and strip trailing spaces, so fragment
/// comments with embedded newlines do not balloon the prompt.
pub fn clean_up_new_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in text.lines() {
        let line = line.trim_end();
        let blank = line.is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line);
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}

/// Issue the structured column-selection call and parse its reply.
pub async fn request_pruning(
    generator: &dyn StructuredGenerator,
    prompt: &str,
) -> Result<PruningSelection> {
    let reply = generator
        .generate(COLUMN_SELECTION_SYSTEM_PROMPT, prompt, response_schema()?)
        .await?;

    let first = reply.replies.first().ok_or_else(|| {
        Error::PruningResponseInvalid("generator returned no replies".to_string())
    })?;

    PruningSelection::from_reply(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_parses_into_selection() {
        let reply = r#"{
            "results": [
                {
                    "table_name": "orders",
                    "table_contents": {
                        "chain_of_thought_reasoning": ["needed for join"],
                        "columns": ["id"]
                    },
                    "table_selection_reason": "holds order facts"
                }
            ]
        }"#;

        let selection = PruningSelection::from_reply(reply).unwrap();
        assert_eq!(selection.len(), 1);
        assert!(selection.contains("orders"));
        assert_eq!(selection.get("orders").unwrap().columns, vec!["id"]);
        assert!(selection.table_names().contains("orders"));
    }

    #[test]
    fn test_malformed_reply_is_invalid() {
        let err = PruningSelection::from_reply("{not json").unwrap_err();
        assert!(matches!(err, Error::PruningResponseInvalid(_)));
    }

    #[test]
    fn test_reply_without_results_is_invalid() {
        let err = PruningSelection::from_reply(r#"{"tables": []}"#).unwrap_err();
        assert!(matches!(err, Error::PruningResponseInvalid(_)));
    }

    #[test]
    fn test_mismatched_reasoning_length_is_accepted() {
        let reply = r#"{
            "results": [
                {
                    "table_name": "orders",
                    "table_contents": {
                        "chain_of_thought_reasoning": ["one reason"],
                        "columns": ["id", "amount"]
                    },
                    "table_selection_reason": "holds order facts"
                }
            ]
        }"#;

        let selection = PruningSelection::from_reply(reply).unwrap();
        let contents = selection.get("orders").unwrap();
        assert_eq!(contents.columns.len(), 2);
        assert_eq!(contents.chain_of_thought_reasoning.len(), 1);
    }

    #[test]
    fn test_response_schema_shape() {
        let schema = response_schema().unwrap();
        assert!(schema["properties"]["results"].is_object());
    }

    #[test]
    fn test_prompt_rendering_flattens_blank_runs() {
        let schemas = vec![
            "CREATE TABLE orders (\n  id INTEGER\n);".to_string(),
            "CREATE TABLE customers (\n  id INTEGER\n);".to_string(),
        ];
        let prompt = render_pruning_prompt("total revenue per customer?", &schemas);

        assert!(prompt.starts_with("### Database Schema ###"));
        assert!(prompt.contains("CREATE TABLE orders"));
        assert!(prompt.contains("### INPUT ###\ntotal revenue per customer?"));
        assert!(!prompt.contains("\n\n\n"));
    }

    #[test]
    fn test_clean_up_new_lines() {
        assert_eq!(
            clean_up_new_lines("a  \n\n\n\nb\nc   \n\n"),
            "a\n\nb\nc"
        );
        assert_eq!(clean_up_new_lines("\n\n"), "");
    }
}
