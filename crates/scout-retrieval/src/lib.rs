//! Schema retrieval pipeline for scout
//!
//! Orchestrates the retrieval-augmented schema selection flow: embed the
//! question, retrieve candidate tables, retrieve and reassemble their
//! schema fragments, check the unpruned DDL set against the model's token
//! budget, and — when it does not fit — ask a structured LLM call to prune
//! the schema down to necessary columns.

pub mod assemble;
pub mod budget;
pub mod pipeline;
pub mod pruning;
pub mod tokenizer;

// Re-exports
pub use assemble::{assemble, RetrievalOutput};
pub use budget::{evaluate_budget, AggregateFlags, BudgetEvaluation, RetrievalResult};
pub use pipeline::{
    QueryHistory, RetrievalRequest, SchemaRetrievalPipeline, SchemaRetrievalPipelineBuilder,
};
pub use pruning::{request_pruning, ColumnSelection, PruningSelection};
pub use tokenizer::TokenCounter;
