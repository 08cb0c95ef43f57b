//! Core traits and types for scout
//!
//! This crate provides the foundational abstractions for the schema
//! retrieval engine: the error taxonomy, configuration loading, the
//! capability traits implemented by concrete backends, and the document
//! and filter types exchanged with the fragment store.

pub mod capabilities;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;

// Re-exports
pub use capabilities::{
    DocumentStore, Embedder, EmbeddingVector, GenerationReply, StructuredGenerator,
};
pub use config::{ModelConfig, RetrievalConfig, ScoutConfig};
pub use document::{DocumentMeta, SchemaDocument};
pub use error::{Error, Result};
pub use filter::{FilterExpr, FilterOp};
