//! Typed schema model for scout
//!
//! Decodes stored schema fragments into a typed model, reassembles
//! fragmented table definitions, and renders prompt-ready DDL text.

pub mod ddl;
pub mod fragment;
pub mod reassemble;

// Re-exports
pub use ddl::{build_metric_ddl, build_table_ddl, build_view_ddl, engine_data_type, DdlFlags};
pub use fragment::{
    content_name, ColumnDescriptor, FragmentContent, MetricFragment, TableDescriptor, ViewFragment,
};
pub use reassemble::reassemble;
