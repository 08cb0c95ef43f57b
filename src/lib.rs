//! Facade crate re-exporting the scout workspace members.

pub use scout_core as core;
pub use scout_model as model;
pub use scout_retrieval as retrieval;
pub use scout_schema as schema;
