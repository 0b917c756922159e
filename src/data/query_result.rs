use serde::Serialize;
use std::collections::BTreeSet;

/// Row position ids still in play during evaluation
pub type CandidateSet = BTreeSet<usize>;

/// Rows sharing one display value of the grouped column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub key: String,
    pub rows: Vec<usize>,
}

/// Output of a query; the shape depends on which clauses were present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QueryResult {
    /// Plain filter
    Rows(CandidateSet),
    /// Sort and/or range applied
    Ordered(Vec<usize>),
    /// Groups in order of first occurrence
    Grouped(Vec<GroupEntry>),
}

impl QueryResult {
    /// Number of rows, across all groups for a grouped result
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Rows(rows) => rows.len(),
            QueryResult::Ordered(rows) => rows.len(),
            QueryResult::Grouped(groups) => groups.iter().map(|g| g.rows.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, row: usize) -> bool {
        match self {
            QueryResult::Rows(rows) => rows.contains(&row),
            QueryResult::Ordered(rows) => rows.contains(&row),
            QueryResult::Grouped(groups) => groups.iter().any(|g| g.rows.contains(&row)),
        }
    }

    /// All row ids, flattened in result order
    pub fn row_ids(&self) -> Vec<usize> {
        match self {
            QueryResult::Rows(rows) => rows.iter().copied().collect(),
            QueryResult::Ordered(rows) => rows.clone(),
            QueryResult::Grouped(groups) => {
                groups.iter().flat_map(|g| g.rows.iter().copied()).collect()
            }
        }
    }

    pub fn group(&self, key: &str) -> Option<&[usize]> {
        match self {
            QueryResult::Grouped(groups) => groups
                .iter()
                .find(|g| g.key == key)
                .map(|g| g.rows.as_slice()),
            _ => None,
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, QueryResult::Grouped(_))
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, QueryResult::Ordered(_))
    }
}
