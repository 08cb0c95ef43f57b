//! Filter expressions for document retrieval.
//!
//! A small boolean AND/OR tree over `{field, operator, value}` leaves,
//! rendered to the wire JSON the fragment store understands:
//!
//! ```json
//! {
//!   "operator": "AND",
//!   "conditions": [
//!     {"field": "type", "operator": "==", "value": "TABLE_SCHEMA"},
//!     {"operator": "OR", "conditions": [...]}
//!   ]
//! }
//! ```

use serde_json::{json, Value};

/// Comparison operator for a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact equality against a single value
    Eq,
    /// Membership in a list of values
    In,
}

impl FilterOp {
    fn as_wire(&self) -> &'static str {
        match self {
            FilterOp::Eq => "==",
            FilterOp::In => "in",
        }
    }
}

/// A boolean filter tree over document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// All conditions must hold
    All(Vec<FilterExpr>),
    /// At least one condition must hold
    Any(Vec<FilterExpr>),
    /// A single field comparison
    Condition {
        field: String,
        op: FilterOp,
        value: Value,
    },
}

impl FilterExpr {
    /// `field == value` leaf
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Condition {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// `field in values` leaf
    pub fn is_in(field: impl Into<String>, values: Vec<String>) -> Self {
        FilterExpr::Condition {
            field: field.into(),
            op: FilterOp::In,
            value: Value::from(values),
        }
    }

    /// AND over the given conditions
    pub fn all(conditions: Vec<FilterExpr>) -> Self {
        FilterExpr::All(conditions)
    }

    /// OR over the given conditions
    pub fn any(conditions: Vec<FilterExpr>) -> Self {
        FilterExpr::Any(conditions)
    }

    /// Append a condition to an `All`/`Any` node.
    ///
    /// Appending to a leaf promotes it to an `All` node first.
    pub fn push(&mut self, condition: FilterExpr) {
        match self {
            FilterExpr::All(conditions) | FilterExpr::Any(conditions) => {
                conditions.push(condition)
            }
            FilterExpr::Condition { .. } => {
                let leaf = std::mem::replace(self, FilterExpr::All(Vec::new()));
                *self = FilterExpr::All(vec![leaf, condition]);
            }
        }
    }

    /// Render the tree into the store's wire JSON representation.
    pub fn to_wire(&self) -> Value {
        match self {
            FilterExpr::All(conditions) => json!({
                "operator": "AND",
                "conditions": conditions.iter().map(|c| c.to_wire()).collect::<Vec<_>>(),
            }),
            FilterExpr::Any(conditions) => json!({
                "operator": "OR",
                "conditions": conditions.iter().map(|c| c.to_wire()).collect::<Vec<_>>(),
            }),
            FilterExpr::Condition { field, op, value } => json!({
                "field": field,
                "operator": op.as_wire(),
                "value": value,
            }),
        }
    }
}
