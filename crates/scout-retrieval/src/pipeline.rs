//! The schema retrieval pipeline.
//!
//! One sequential flow per request: embed the question, retrieve candidate
//! tables, retrieve their schema fragments, reassemble, budget-check, and
//! optionally prune columns through one structured LLM call. The pipeline
//! holds no mutable state across requests; every per-request structure is
//! freshly allocated.

use crate::assemble::{assemble, RetrievalOutput};
use crate::budget::evaluate_budget;
use crate::pruning::{render_pruning_prompt, request_pruning};
use crate::tokenizer::TokenCounter;
use scout_core::{
    DocumentStore, Embedder, EmbeddingVector, Error, FilterExpr, Result, ScoutConfig,
    SchemaDocument, StructuredGenerator,
};
use scout_schema::{build_table_ddl, content_name, reassemble};
use std::sync::Arc;

/// One prior turn of the conversation.
#[derive(Debug, Clone, Default)]
pub struct QueryHistory {
    pub question: String,
    /// SQL produced for that turn, when available
    pub sql: Option<String>,
}

/// Input to one retrieval run.
#[derive(Debug, Clone, Default)]
pub struct RetrievalRequest {
    /// Current natural-language question; may be empty
    pub query: String,
    /// Exact table names to fall back to when there is no query text
    pub tables: Vec<String>,
    /// Project scope for multi-tenant fragment stores
    pub project_id: Option<String>,
    /// Prior conversation turns, oldest first
    pub histories: Vec<QueryHistory>,
    /// Force the column-pruning path for this request
    pub enable_column_pruning: bool,
}

/// Retrieval pipeline over pluggable capability backends.
pub struct SchemaRetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    table_store: Arc<dyn DocumentStore>,
    schema_store: Arc<dyn DocumentStore>,
    generator: Arc<dyn StructuredGenerator>,
    counter: TokenCounter,
    context_window_size: usize,
    table_retrieval_size: usize,
    table_column_retrieval_size: usize,
    enable_column_pruning: bool,
}

impl SchemaRetrievalPipeline {
    pub fn builder() -> SchemaRetrievalPipelineBuilder {
        SchemaRetrievalPipelineBuilder::new()
    }

    /// Run one retrieval.
    pub async fn run(&self, request: &RetrievalRequest) -> Result<RetrievalOutput> {
        tracing::debug!(query = %request.query, "schema retrieval pipeline is running");

        let combined_query = combine_query(&request.histories, &request.query);

        let embedding = if request.query.is_empty() {
            None
        } else {
            Some(self.embedder.embed(&combined_query).await?)
        };

        let table_documents = self.table_retrieval(embedding.as_ref(), request).await?;
        let table_names: Vec<String> = table_documents
            .iter()
            .filter_map(content_name)
            .collect();
        tracing::debug!(candidates = table_names.len(), "table retrieval complete");

        let schema_documents = if table_names.is_empty() {
            Vec::new()
        } else {
            self.schema_retrieval(&table_names, request.project_id.as_deref())
                .await?
        };

        let tables = reassemble(&schema_documents);

        let evaluation = evaluate_budget(
            &tables,
            &schema_documents,
            &self.counter,
            self.context_window_size,
            request.enable_column_pruning || self.enable_column_pruning,
        );

        let selection = if evaluation.pruning_required && !combined_query.trim().is_empty() {
            let db_schemas: Vec<String> = tables
                .iter()
                .map(|table| build_table_ddl(table, None, None).0)
                .collect();
            let prompt = render_pruning_prompt(&combined_query, &db_schemas);
            Some(request_pruning(self.generator.as_ref(), &prompt).await?)
        } else {
            if evaluation.pruning_required {
                tracing::debug!("pruning required but no query text, skipping column selection");
            }
            None
        };

        let token_count = evaluation.token_count;
        let output = assemble(evaluation, selection.as_ref(), &tables, &schema_documents);

        tracing::info!(
            results = output.retrieval_results.len(),
            token_count,
            "schema retrieval complete"
        );

        Ok(output)
    }

    async fn table_retrieval(
        &self,
        embedding: Option<&EmbeddingVector>,
        request: &RetrievalRequest,
    ) -> Result<Vec<SchemaDocument>> {
        let mut filters = FilterExpr::all(vec![FilterExpr::eq("type", "TABLE_DESCRIPTION")]);
        if let Some(project_id) = &request.project_id {
            filters.push(FilterExpr::eq("project_id", project_id.clone()));
        }

        match embedding {
            Some(embedding) => {
                self.table_store
                    .retrieve(&embedding.vector, &filters, self.table_retrieval_size)
                    .await
            }
            None => {
                // No query text: fall back to exact-name filtering over the
                // supplied table list instead of vector search.
                filters.push(FilterExpr::is_in("name", request.tables.clone()));
                self.table_store
                    .retrieve(&[], &filters, self.table_retrieval_size)
                    .await
            }
        }
    }

    async fn schema_retrieval(
        &self,
        table_names: &[String],
        project_id: Option<&str>,
    ) -> Result<Vec<SchemaDocument>> {
        let name_conditions = table_names
            .iter()
            .map(|name| FilterExpr::eq("name", name.clone()))
            .collect();

        let mut filters = FilterExpr::all(vec![
            FilterExpr::eq("type", "TABLE_SCHEMA"),
            FilterExpr::any(name_conditions),
        ]);
        if let Some(project_id) = project_id {
            filters.push(FilterExpr::eq("project_id", project_id));
        }

        self.schema_store
            .retrieve(&[], &filters, self.table_column_retrieval_size)
            .await
    }
}

/// Join prior history questions (newline-separated, history first) with the
/// current question.
fn combine_query(histories: &[QueryHistory], query: &str) -> String {
    if histories.is_empty() {
        return query.to_string();
    }

    let summaries: Vec<&str> = histories
        .iter()
        .map(|history| history.question.as_str())
        .collect();
    format!("{}\n{}", summaries.join("\n"), query)
}

/// Builder for [`SchemaRetrievalPipeline`]
pub struct SchemaRetrievalPipelineBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    table_store: Option<Arc<dyn DocumentStore>>,
    schema_store: Option<Arc<dyn DocumentStore>>,
    generator: Option<Arc<dyn StructuredGenerator>>,
    model_name: String,
    context_window_size: usize,
    table_retrieval_size: usize,
    table_column_retrieval_size: usize,
    enable_column_pruning: bool,
}

impl SchemaRetrievalPipelineBuilder {
    pub fn new() -> Self {
        let config = ScoutConfig::default();
        Self {
            embedder: None,
            table_store: None,
            schema_store: None,
            generator: None,
            model_name: config.model.model_name,
            context_window_size: config.model.context_window_size,
            table_retrieval_size: config.retrieval.table_retrieval_size,
            table_column_retrieval_size: config.retrieval.table_column_retrieval_size,
            enable_column_pruning: config.retrieval.enable_column_pruning,
        }
    }

    /// Take model and retrieval settings from a loaded configuration.
    pub fn config(mut self, config: &ScoutConfig) -> Self {
        self.model_name = config.model.model_name.clone();
        self.context_window_size = config.model.context_window_size;
        self.table_retrieval_size = config.retrieval.table_retrieval_size;
        self.table_column_retrieval_size = config.retrieval.table_column_retrieval_size;
        self.enable_column_pruning = config.retrieval.enable_column_pruning;
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn table_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.table_store = Some(store);
        self
    }

    pub fn schema_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.schema_store = Some(store);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn StructuredGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn context_window_size(mut self, size: usize) -> Self {
        self.context_window_size = size;
        self
    }

    pub fn table_retrieval_size(mut self, size: usize) -> Self {
        self.table_retrieval_size = size;
        self
    }

    pub fn table_column_retrieval_size(mut self, size: usize) -> Self {
        self.table_column_retrieval_size = size;
        self
    }

    pub fn enable_column_pruning(mut self, enable: bool) -> Self {
        self.enable_column_pruning = enable;
        self
    }

    pub fn build(self) -> Result<SchemaRetrievalPipeline> {
        let embedder = self
            .embedder
            .ok_or_else(|| Error::Config("SchemaRetrievalPipeline requires an embedder".into()))?;
        let table_store = self.table_store.ok_or_else(|| {
            Error::Config("SchemaRetrievalPipeline requires a table store".into())
        })?;
        let schema_store = self.schema_store.ok_or_else(|| {
            Error::Config("SchemaRetrievalPipeline requires a schema store".into())
        })?;
        let generator = self.generator.ok_or_else(|| {
            Error::Config("SchemaRetrievalPipeline requires a generator".into())
        })?;

        let counter = TokenCounter::for_model(&self.model_name)?;

        Ok(SchemaRetrievalPipeline {
            embedder,
            table_store,
            schema_store,
            generator,
            counter,
            context_window_size: self.context_window_size,
            table_retrieval_size: self.table_retrieval_size,
            table_column_retrieval_size: self.table_column_retrieval_size,
            enable_column_pruning: self.enable_column_pruning,
        })
    }
}

impl Default for SchemaRetrievalPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
