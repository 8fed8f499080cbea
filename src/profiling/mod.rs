//! Column profiling for relational metadata tables.
//!
//! Each column is classified into a [`ColumnCategory`](crate::core::types::ColumnCategory)
//! in two phases: its name against per-category aliases, then (if the name is
//! unknown) a bounded sample of its values against the same vocabulary the
//! screening criteria use. Classified columns are ranked into a [`RelevanceMap`].

pub mod column;
pub mod profiler;

pub use column::{ColumnProfile, ProfileEvidence, TableColumn, TableSample};
pub use profiler::{ColumnProfiler, RelevanceMap};
