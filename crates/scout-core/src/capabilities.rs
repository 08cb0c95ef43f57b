//! Capability traits implemented by concrete backends.
//!
//! The retrieval pipeline depends only on these interfaces, never on a
//! specific embedding, document-store, or model backend. Each method is a
//! single blocking network round-trip from the pipeline's perspective; no
//! retries happen at this layer.

use crate::{FilterExpr, Result, SchemaDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Embedding vector result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// The embedding vector values
    pub vector: Vec<f32>,
    /// Number of dimensions in the vector
    pub dimensions: usize,
}

impl EmbeddingVector {
    /// Create a new embedding vector
    pub fn new(vector: Vec<f32>) -> Self {
        let dimensions = vector.len();
        Self { vector, dimensions }
    }
}

/// Text embedding capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a vector representation.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;
}

/// Document retrieval capability over the schema fragment store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieve documents matching the filter tree, ranked against the
    /// query embedding when one is supplied.
    ///
    /// An empty `query_embedding` means filter-only retrieval (no vector
    /// ranking), which backends must support.
    async fn retrieve(
        &self,
        query_embedding: &[f32],
        filters: &FilterExpr,
        top_k: usize,
    ) -> Result<Vec<SchemaDocument>>;
}

/// Replies from a structured generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReply {
    /// Raw reply texts; `replies[0]` is expected to be JSON conforming to
    /// the requested response schema.
    pub replies: Vec<String>,
}

/// Structured-output generation capability.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Run one generation constrained to the given JSON schema.
    async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
        response_schema: serde_json::Value,
    ) -> Result<GenerationReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_vector_dimensions() {
        let embedding = EmbeddingVector::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(embedding.dimensions, 3);
        assert_eq!(embedding.vector.len(), 3);
    }
}
