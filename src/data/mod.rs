//! Data layer
//!
//! Row storage, cell values and their comparison, type inference, the
//! per-column secondary index and the query engine that ties them together.

pub mod data_index;
pub mod datatable;
pub mod datavalue_compare;
pub mod query_engine;
pub mod query_result;
pub mod type_inference;
