use super::clause::{Clause, FuzzyClause, GroupClause, RangeClause, SelectClause, SortClause};
use crate::plugins::Operator;

/// The engine's current query, kept as clauses and rendered to text only
/// for display or re-parsing.
///
/// Selects accumulate; sort, range, group and search hold at most one
/// clause each and `set_*` replaces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    selects: Vec<SelectClause>,
    sort: Option<SortClause>,
    range: Option<RangeClause>,
    group: Option<GroupClause>,
    search: Option<FuzzyClause>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_select(&mut self, select: SelectClause) {
        self.selects.push(select);
    }

    /// Replace every select on the same field
    pub fn set_select(&mut self, select: SelectClause) {
        self.remove_select(&select.field, None, None);
        self.add_select(select);
    }

    /// Remove selects on `field`, optionally only those with the given
    /// operator and/or value. Returns how many were removed.
    pub fn remove_select(
        &mut self,
        field: &str,
        operator: Option<Operator>,
        value: Option<&str>,
    ) -> usize {
        let before = self.selects.len();
        self.selects.retain(|s| {
            let hit = s.field == field
                && operator.map_or(true, |op| s.operator == op)
                && value.map_or(true, |v| s.value == v);
            !hit
        });
        before - self.selects.len()
    }

    pub fn set_sort(&mut self, sort: SortClause) {
        self.sort = Some(sort);
    }

    pub fn remove_sort(&mut self) -> Option<SortClause> {
        self.sort.take()
    }

    pub fn set_range(&mut self, range: RangeClause) {
        self.range = Some(range);
    }

    pub fn remove_range(&mut self) -> Option<RangeClause> {
        self.range.take()
    }

    pub fn set_group(&mut self, group: GroupClause) {
        self.group = Some(group);
    }

    pub fn remove_group(&mut self) -> Option<GroupClause> {
        self.group.take()
    }

    pub fn set_search(&mut self, search: FuzzyClause) {
        self.search = Some(search);
    }

    pub fn remove_search(&mut self) -> Option<FuzzyClause> {
        self.search.take()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.selects.is_empty()
            && self.sort.is_none()
            && self.range.is_none()
            && self.group.is_none()
            && self.search.is_none()
    }

    pub fn selects(&self) -> &[SelectClause] {
        &self.selects
    }

    pub fn clauses(&self) -> Vec<Clause> {
        let mut clauses: Vec<Clause> = self.selects.iter().cloned().map(Clause::Select).collect();
        clauses.extend(self.sort.clone().map(Clause::Sort));
        clauses.extend(self.range.map(Clause::Range));
        clauses.extend(self.group.clone().map(Clause::Group));
        clauses.extend(self.search.clone().map(Clause::Fuzzy));
        clauses
    }

    /// Render as query text. Values are quoted and escaped so that parsing
    /// the text yields the same clauses.
    pub fn to_query_string(&self) -> String {
        self.clauses()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }
}
