//! Documents returned by the schema fragment store.

use serde::{Deserialize, Serialize};

/// Metadata attached to a stored schema fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Table (or metric/view) name the fragment belongs to
    pub name: String,
    /// Fragment kind tag as stored (e.g. "TABLE_SCHEMA", "TABLE_DESCRIPTION")
    #[serde(rename = "type")]
    pub kind: String,
    /// Project scope, when the store is multi-tenant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// A single document from the fragment store.
///
/// `content` is an externally-defined JSON literal describing a descriptor
/// or partial descriptor. It is decoded once at ingestion (see
/// `scout-schema`) and never re-encoded by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub content: String,
    pub meta: DocumentMeta,
}

impl SchemaDocument {
    pub fn new(content: impl Into<String>, meta: DocumentMeta) -> Self {
        Self {
            content: content.into(),
            meta,
        }
    }
}
