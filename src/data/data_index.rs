//! Per-column secondary indices
//!
//! Each column maps its distinct values to the set of row position ids that
//! hold them. The buckets of one column always partition the full id set.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

use crate::data::datatable::{DataTable, DataValue};

/// Hashable identity of a cell value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(u64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl From<&DataValue> for IndexKey {
    fn from(value: &DataValue) -> Self {
        match value {
            DataValue::Null => IndexKey::Null,
            DataValue::Boolean(b) => IndexKey::Boolean(*b),
            DataValue::Integer(i) => IndexKey::Integer(*i),
            DataValue::Float(f) => {
                // -0.0 and 0.0 compare equal, so they share a bucket
                let normalized = if *f == 0.0 { 0.0 } else { *f };
                IndexKey::Float(normalized.to_bits())
            }
            DataValue::String(s) => IndexKey::Text(s.clone()),
            DataValue::DateTime(dt) => IndexKey::DateTime(*dt),
        }
    }
}

/// All rows sharing one value
#[derive(Debug, Clone)]
pub struct IndexBucket {
    pub value: DataValue,
    pub rows: BTreeSet<usize>,
}

/// Value buckets for a single column
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    buckets: HashMap<IndexKey, IndexBucket>,
}

impl ColumnIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: &DataValue, row: usize) {
        self.buckets
            .entry(IndexKey::from(value))
            .or_insert_with(|| IndexBucket {
                value: value.clone(),
                rows: BTreeSet::new(),
            })
            .rows
            .insert(row);
    }

    /// Remove `row` from the bucket of `value`. Empty buckets are kept.
    pub fn remove(&mut self, value: &DataValue, row: usize) -> bool {
        self.buckets
            .get_mut(&IndexKey::from(value))
            .map_or(false, |bucket| bucket.rows.remove(&row))
    }

    /// Number of buckets, including ones emptied by edits
    pub fn distinct_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &IndexBucket> {
        self.buckets.values()
    }

    pub fn rows_for(&self, value: &DataValue) -> Option<&BTreeSet<usize>> {
        self.buckets.get(&IndexKey::from(value)).map(|b| &b.rows)
    }

    /// Union of every bucket, in id order
    pub fn row_ids(&self) -> BTreeSet<usize> {
        self.buckets
            .values()
            .flat_map(|b| b.rows.iter().copied())
            .collect()
    }

    /// True when the buckets are pairwise disjoint and cover `0..row_count`
    pub fn is_partition_of(&self, row_count: usize) -> bool {
        let total: usize = self.buckets.values().map(|b| b.rows.len()).sum();
        let union = self.row_ids();
        total == row_count && union.len() == row_count && union.iter().copied().eq(0..row_count)
    }
}

/// Secondary indices for every column of a table, owned by the engine
#[derive(Debug, Clone, Default)]
pub struct DataIndex {
    columns: Vec<ColumnIndex>,
}

impl DataIndex {
    /// Build indices for all columns in one pass over the rows
    pub fn build(table: &DataTable) -> Self {
        let mut columns = vec![ColumnIndex::new(); table.column_count()];

        for row in &table.rows {
            for (col_idx, index) in columns.iter_mut().enumerate() {
                let value = row.get(col_idx).unwrap_or(&DataValue::Null);
                index.insert(value, row.id);
            }
        }

        for (column, index) in table.columns.iter().zip(&columns) {
            debug!(
                "DataIndex: column '{}' has {} distinct values",
                column.name,
                index.distinct_count()
            );
        }
        info!(
            "DataIndex: built {} column indices over {} rows",
            columns.len(),
            table.row_count()
        );

        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, col_idx: usize) -> Option<&ColumnIndex> {
        self.columns.get(col_idx)
    }

    /// Move `row` from the bucket of `old` to the bucket of `new` in one column
    pub fn move_row(&mut self, col_idx: usize, row: usize, old: &DataValue, new: &DataValue) {
        if let Some(index) = self.columns.get_mut(col_idx) {
            let removed = index.remove(old, row);
            debug_assert!(removed, "row {} missing from its old bucket", row);
            index.insert(new, row);
        }
    }
}
