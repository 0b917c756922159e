//! Configuration module
//!
//! Engine settings: field-name matching, value matching, search mode and
//! index behaviour. Loaded from TOML.

#[allow(clippy::module_inception)]
pub mod config;

pub use config::{EngineConfig, FieldConfig, IndexConfig, SearchConfig, SearchMode, ValueConfig};
