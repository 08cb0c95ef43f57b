//! Typed decoding of schema fragment content.
//!
//! A stored document's `content` is a JSON literal tagged with a `type`
//! field. It is decoded exactly once, into [`FragmentContent`], rather than
//! re-interpreted loosely at every use site. A document whose content does
//! not decode is logged and dropped; the schema degrades gracefully.

use scout_core::SchemaDocument;
use serde::Deserialize;

/// A single column of a table, metric, or reassembled descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_calculated: bool,
    #[serde(default)]
    pub is_json_field: bool,
    /// Tables a calculated expression reads from; empty for plain columns
    #[serde(default)]
    pub referenced_tables: Vec<String>,
}

impl ColumnDescriptor {
    /// Columns with an unknown data type are never emitted in DDL, but the
    /// column still exists conceptually (it can appear in a selection).
    pub fn is_unknown_type(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("unknown")
    }

    pub fn is_json_type(&self) -> bool {
        self.is_json_field || self.data_type.eq_ignore_ascii_case("json")
    }
}

/// Static table metadata, as carried by a `TABLE` fragment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableFragment {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    /// Present when the fragment was stored unfragmented
    #[serde(default)]
    pub columns: Option<Vec<ColumnDescriptor>>,
}

/// Column list carried by a `TABLE_COLUMNS` fragment. The owning table is
/// identified by the document's `meta.name`, not by the content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnsFragment {
    pub columns: Vec<ColumnDescriptor>,
}

/// A metric definition; self-contained, never fragmented.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricFragment {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    pub columns: Vec<ColumnDescriptor>,
}

/// A view definition; the statement is opaque SQL text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ViewFragment {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    pub statement: String,
}

/// Decoded content of one stored schema fragment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum FragmentContent {
    #[serde(rename = "TABLE")]
    Table(TableFragment),
    #[serde(rename = "TABLE_COLUMNS")]
    TableColumns(ColumnsFragment),
    #[serde(rename = "METRIC")]
    Metric(MetricFragment),
    #[serde(rename = "VIEW")]
    View(ViewFragment),
}

impl FragmentContent {
    /// Decode a document's content, dropping it (with a warning) when the
    /// content is malformed or carries an unrecognized tag.
    pub fn decode(document: &SchemaDocument) -> Option<FragmentContent> {
        match serde_json::from_str(&document.content) {
            Ok(content) => Some(content),
            Err(err) => {
                tracing::warn!(
                    name = %document.meta.name,
                    error = %err,
                    "dropping malformed schema fragment"
                );
                None
            }
        }
    }
}

/// Extract only the `name` field of a document's content, used for the
/// table-descriptions retrieval stage.
pub fn content_name(document: &SchemaDocument) -> Option<String> {
    #[derive(Deserialize)]
    struct Named {
        name: String,
    }

    match serde_json::from_str::<Named>(&document.content) {
        Ok(named) => Some(named.name),
        Err(err) => {
            tracing::warn!(
                name = %document.meta.name,
                error = %err,
                "dropping table description without a decodable name"
            );
            None
        }
    }
}

/// A complete, reassembled table definition, ready for DDL generation.
///
/// Only plain tables are reassembled; metrics and views are self-contained
/// per fragment and stay as [`MetricFragment`] / [`ViewFragment`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub comment: String,
    pub columns: Vec<ColumnDescriptor>,
}
