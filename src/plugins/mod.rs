//! Type plugins
//!
//! Every column is bound to a [`TypePlugin`] that knows how to validate,
//! canonicalise and compare values of its type and how to narrow a
//! candidate set for a Select clause. Plugins are looked up by type name in
//! a [`PluginRegistry`]; hosts may register their own or override built-ins.

pub mod boolean;
pub mod date;
pub mod email;
pub mod enumeration;
pub mod number;
pub mod operator;
pub mod phone;
pub mod string;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

use crate::config::ValueConfig;
use crate::data::data_index::ColumnIndex;
use crate::data::datatable::{DataTable, DataValue};
use crate::data::query_result::CandidateSet;
use crate::query::SelectClause;

pub use boolean::BooleanPlugin;
pub use date::DatePlugin;
pub use email::EmailPlugin;
pub use enumeration::EnumPlugin;
pub use number::NumberPlugin;
pub use operator::{split_between, split_list, Operand, Operator};
pub use phone::PhonePlugin;
pub use string::StringPlugin;

/// How a Select clause walks the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Test each distinct value once and drop whole buckets
    IndexScan,
    /// Test each candidate row
    CandidateScan,
}

/// Pick the cheaper strategy: scanning the index costs one predicate per
/// distinct value, scanning candidates one per surviving row
pub fn choose_strategy(index: Option<&ColumnIndex>, candidates: &CandidateSet) -> ScanStrategy {
    match index {
        Some(index) if index.distinct_count() <= candidates.len() => ScanStrategy::IndexScan,
        _ => ScanStrategy::CandidateScan,
    }
}

/// Per-type semantics for validation, coercion, comparison and filtering
pub trait TypePlugin: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Operators this type accepts
    fn operators(&self) -> &[Operator];

    fn supports(&self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }

    /// True iff `raw` is acceptable input for this type
    fn validate(&self, raw: &str) -> bool;

    /// Operator-aware validation of a query operand
    fn validate_operand(&self, operator: Operator, raw: &str) -> bool {
        match operator {
            Operator::In => {
                let items = split_list(raw);
                !items.is_empty() && items.iter().all(|item| self.validate(item))
            }
            Operator::Between => split_between(raw)
                .map_or(false, |(low, high)| self.validate(low) && self.validate(high)),
            _ => self.validate(raw),
        }
    }

    /// Coerce to the canonical in-memory form. Must be idempotent.
    fn parse_value(&self, raw: &DataValue) -> DataValue;

    fn parse_text(&self, raw: &str) -> DataValue {
        self.parse_value(&DataValue::String(raw.trim().to_string()))
    }

    /// Parse a query operand into the shape its operator expects
    fn parse_operand(&self, operator: Operator, raw: &str) -> Operand {
        match operator {
            Operator::In => Operand::List(
                split_list(raw)
                    .into_iter()
                    .map(|item| self.parse_text(item))
                    .collect(),
            ),
            Operator::Between => match split_between(raw) {
                Some((low, high)) => Operand::Between(self.parse_text(low), self.parse_text(high)),
                None => Operand::Single(self.parse_text(raw)),
            },
            _ if operator.is_textual() => Operand::Single(DataValue::String(raw.to_string())),
            _ => Operand::Single(self.parse_text(raw)),
        }
    }

    /// Sort order for two canonical values of this type
    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering;

    fn equals(&self, a: &DataValue, b: &DataValue) -> bool {
        self.compare(a, b) == Ordering::Equal
    }

    /// Atomic predicate for the operators beyond equality and membership
    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool;

    /// Full predicate for one cell
    fn matches(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        match (operator, operand) {
            (Operator::Equal, Operand::Single(value)) => self.equals(data, value),
            (Operator::NotEqual, Operand::Single(value)) => !self.equals(data, value),
            (Operator::In, Operand::List(values)) => {
                values.iter().any(|value| self.equals(data, value))
            }
            _ => self.evaluate_condition(data, operator, operand),
        }
    }

    /// Narrow `candidates` to the rows satisfying `select`
    fn evaluate(
        &self,
        select: &SelectClause,
        col_idx: usize,
        index: Option<&ColumnIndex>,
        table: &DataTable,
        candidates: &mut CandidateSet,
    ) {
        let strategy = choose_strategy(index, candidates);
        debug!(
            "{}: evaluating '{}' with {:?} over {} candidates",
            self.name(),
            select,
            strategy,
            candidates.len()
        );
        scan(self, strategy, select, col_idx, index, table, candidates);
    }
}

/// Run one strategy explicitly. `IndexScan` without an index falls back to
/// scanning candidates.
pub fn scan<P: TypePlugin + ?Sized>(
    plugin: &P,
    strategy: ScanStrategy,
    select: &SelectClause,
    col_idx: usize,
    index: Option<&ColumnIndex>,
    table: &DataTable,
    candidates: &mut CandidateSet,
) {
    let operand = plugin.parse_operand(select.operator, &select.value);

    match (strategy, index) {
        (ScanStrategy::IndexScan, Some(index)) => {
            for bucket in index.buckets() {
                if !plugin.matches(&bucket.value, select.operator, &operand) {
                    for row in &bucket.rows {
                        candidates.remove(row);
                    }
                }
            }
        }
        _ => {
            candidates.retain(|&row| {
                let value = table.get_value(row, col_idx).unwrap_or(&DataValue::Null);
                plugin.matches(value, select.operator, &operand)
            });
        }
    }
}

/// Plugins keyed by lowercase type name
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn TypePlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in type
    pub fn with_builtins(values: &ValueConfig) -> Self {
        let mut registry = Self::new();
        registry.register("string", Arc::new(StringPlugin::new(values.case_insensitive)));
        registry.register("number", Arc::new(NumberPlugin));
        registry.register("boolean", Arc::new(BooleanPlugin));
        registry.register("date", Arc::new(DatePlugin));
        registry.register("email", Arc::new(EmailPlugin));
        registry.register("enum", Arc::new(EnumPlugin::new()));
        registry.register("phone", Arc::new(PhonePlugin));
        registry
    }

    /// Register or replace the plugin for `name`
    pub fn register(&mut self, name: &str, plugin: Arc<dyn TypePlugin>) {
        if self
            .plugins
            .insert(name.to_lowercase(), plugin)
            .is_some()
        {
            debug!("PluginRegistry: overriding plugin '{}'", name);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn TypePlugin>> {
        self.plugins.get(&name.to_lowercase()).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugins.keys().cloned().collect();
        names.sort();
        names
    }
}
