//! High-level operations wiring the `linkcheck` CLI to the core pipeline:
//! resolve, fetch, build classpath, check linkage, and render reports.

pub mod ops_check;
pub mod ops_fetch;
pub mod ops_report;
pub mod ops_tree;
