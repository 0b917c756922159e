use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

use crate::plugins::TypePlugin;

/// Column metadata and its bound type plugin
#[derive(Debug, Clone)]
pub struct DataColumn {
    pub name: String,
    /// Declared or auto-detected type name, `None` when nothing was declared
    /// and auto-detection was off
    pub type_name: Option<String>,
    pub editable: bool,
    pub groupable: bool,
    pub sortable: bool,
    pub unique: bool,
    /// Allowed values for `enum` columns
    pub values: Option<Vec<String>>,
    pub null_count: usize,
    pub plugin: Option<Arc<dyn TypePlugin>>,
}

impl DataColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            editable: true,
            groupable: true,
            sortable: true,
            unique: false,
            values: None,
            null_count: 0,
            plugin: None,
        }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn TypePlugin>) -> Self {
        self.plugin = Some(plugin);
        self
    }

    pub fn plugin(&self) -> Option<&Arc<dyn TypePlugin>> {
        self.plugin.as_ref()
    }
}

/// A single cell value in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Numeric view of the value, strings are parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Integer(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Boolean(value)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::DateTime(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            DataValue::Null => write!(f, ""),
        }
    }
}

/// A row of data in the table, tagged with its position id
#[derive(Debug, Clone)]
pub struct DataRow {
    pub id: usize,
    pub values: Vec<DataValue>,
}

impl DataRow {
    pub fn new(id: usize, values: Vec<DataValue>) -> Self {
        Self { id, values }
    }

    pub fn get(&self, index: usize) -> Option<&DataValue> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DataValue> {
        self.values.get_mut(index)
    }
}

/// Insertion-ordered row storage plus column headers.
///
/// Row position ids equal their index in `rows`; rows are never removed.
#[derive(Debug, Clone)]
pub struct DataTable {
    pub name: String,
    pub columns: Vec<DataColumn>,
    pub rows: Vec<DataRow>,
}

impl DataTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn add_column(&mut self, column: DataColumn) -> &mut Self {
        self.columns.push(column);
        self
    }

    /// Append a row, padding missing trailing cells with `Null`.
    /// Returns the assigned position id.
    pub fn push_row(&mut self, mut values: Vec<DataValue>) -> usize {
        values.resize(self.columns.len(), DataValue::Null);
        let id = self.rows.len();
        self.rows.push(DataRow::new(id, values));
        id
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a value at specific row and column
    pub fn get_value(&self, row: usize, col: usize) -> Option<&DataValue> {
        self.rows.get(row)?.get(col)
    }

    /// Recount nulls per column after import
    pub fn refresh_null_counts(&mut self) {
        for (col_idx, column) in self.columns.iter_mut().enumerate() {
            column.null_count = self
                .rows
                .iter()
                .filter(|row| row.get(col_idx).map_or(true, DataValue::is_null))
                .count();
        }
    }
}

/// Convert a decoded JSON scalar into a raw cell value.
/// Arrays and objects are kept as their JSON text.
pub fn json_value_to_data_value(json: &JsonValue) -> DataValue {
    match json {
        JsonValue::Null => DataValue::Null,
        JsonValue::Bool(b) => DataValue::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                DataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                DataValue::Float(f)
            } else {
                DataValue::String(n.to_string())
            }
        }
        JsonValue::String(s) => DataValue::String(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => DataValue::String(json.to_string()),
    }
}
