//! In-memory query engine for tabular grid data.
//!
//! Rows are imported once, bound to per-column type plugins and indexed per
//! column. A small query language filters, range-limits, groups, searches
//! and sorts them:
//!
//! ```text
//! age >= 26 and name %= A and sort age desc and range 1-10
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod plugins;
pub mod query;
pub mod utils;

pub use config::EngineConfig;
pub use data::datatable::{DataColumn, DataRow, DataTable, DataValue};
pub use data::query_engine::{HeaderSpec, ImportOptions, QueryEngine, QueryReport, RawRow};
pub use data::query_result::{CandidateSet, GroupEntry, QueryResult};
pub use error::{QueryError, Result};
pub use plugins::{Operator, PluginRegistry, ScanStrategy, TypePlugin};
pub use query::{DiagnosticKind, ParseDiagnostic, RangeClause, SortDirection};
