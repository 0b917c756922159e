use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{EngineConfig, SearchMode};
use crate::data::data_index::{ColumnIndex, DataIndex, IndexKey};
use crate::data::datatable::{json_value_to_data_value, DataColumn, DataRow, DataTable, DataValue};
use crate::data::datavalue_compare::compare_datavalues;
use crate::data::query_result::{CandidateSet, GroupEntry, QueryResult};
use crate::data::type_inference::TypeInference;
use crate::error::{QueryError, Result};
use crate::plugins::{EnumPlugin, Operator, PluginRegistry, TypePlugin};
use crate::query::{
    DiagnosticKind, FuzzyClause, GroupClause, ParseDiagnostic, ParsedQuery, QueryBuilder,
    QueryParser, RangeClause, SelectClause, SortClause, SortDirection,
};

/// One input record: column name to raw value. Missing keys become `Null`.
pub type RawRow = Vec<(String, DataValue)>;

/// Declared metadata for one column
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub name: String,
    /// Plugin type name; `None` leaves the column to auto-detection
    pub type_name: Option<String>,
    pub editable: bool,
    pub groupable: bool,
    pub sortable: bool,
    pub unique: bool,
    /// Allowed labels for `enum` columns
    pub values: Option<Vec<String>>,
}

impl HeaderSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            editable: true,
            groupable: true,
            sortable: true,
            unique: false,
            values: None,
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_values(mut self, values: Vec<String>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn groupable(mut self, groupable: bool) -> Self {
        self.groupable = groupable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub headers: Vec<HeaderSpec>,
    /// Infer a type for columns without a declared one; otherwise such
    /// columns stay unbound
    pub auto_detect: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            headers: Vec::new(),
            auto_detect: true,
        }
    }
}

/// Result of a query plus diagnostics for every sub-clause that was dropped
/// or ignored
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub result: QueryResult,
    pub diagnostics: Vec<ParseDiagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryStage {
    Parsed,
    Filtered,
    RangeApplied,
    GroupApplied,
    FuzzyApplied,
    Sorted,
    Done,
}

/// Owns the dataset, its headers and plugin bindings, and the secondary
/// index. Queries borrow it immutably; import and edits need `&mut`.
pub struct QueryEngine {
    config: EngineConfig,
    registry: PluginRegistry,
    table: DataTable,
    index: DataIndex,
    builder: QueryBuilder,
    imported: bool,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let registry = PluginRegistry::with_builtins(&config.values);
        Self {
            config,
            registry,
            table: DataTable::new("grid"),
            index: DataIndex::default(),
            builder: QueryBuilder::new(),
            imported: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Register or override a type plugin. Only allowed before import.
    pub fn register_plugin(&mut self, name: &str, plugin: Arc<dyn TypePlugin>) -> Result<()> {
        if self.imported {
            return Err(QueryError::HeadersLocked(name.to_string()));
        }
        self.registry.register(name, plugin);
        Ok(())
    }

    /// Load rows and bind headers. Row position ids follow input order.
    pub fn import_data(&mut self, rows: Vec<RawRow>, options: ImportOptions) -> Result<()> {
        if self.imported {
            return Err(QueryError::AlreadyImported {
                rows: self.table.row_count(),
            });
        }

        // Declared headers first, then undeclared keys in order of first sight
        let mut specs: Vec<HeaderSpec> = Vec::new();
        for (i, header) in options.headers.into_iter().enumerate() {
            if header.name.trim().is_empty() {
                return Err(QueryError::MissingHeader(format!("#{}", i)));
            }
            if !specs.iter().any(|s| s.name == header.name) {
                specs.push(header);
            }
        }
        let declared = specs.len();
        for row in &rows {
            for (key, _) in row {
                if !specs.iter().any(|s| &s.name == key) {
                    specs.push(HeaderSpec::new(key.clone()));
                }
            }
        }
        debug!(
            "QueryEngine: {} declared and {} discovered columns",
            declared,
            specs.len() - declared
        );

        let mut table = DataTable::new(self.table.name.clone());
        for spec in &specs {
            let mut column = DataColumn::new(spec.name.clone());
            column.editable = spec.editable;
            column.groupable = spec.groupable;
            column.sortable = spec.sortable;
            column.unique = spec.unique;
            column.values = spec.values.clone();
            table.add_column(column);
        }
        for row in rows {
            let mut values = vec![DataValue::Null; specs.len()];
            for (key, value) in row {
                if let Some(col_idx) = table.get_column_index(&key) {
                    values[col_idx] = value;
                }
            }
            table.push_row(values);
        }

        for col_idx in 0..table.column_count() {
            let type_name = match &specs[col_idx].type_name {
                Some(type_name) => Some(type_name.to_lowercase()),
                None if options.auto_detect => {
                    let inferred = TypeInference::infer_column(
                        table.rows.iter().filter_map(|row| row.get(col_idx)),
                    );
                    Some(inferred.type_name().to_string())
                }
                None => None,
            };

            let Some(type_name) = type_name else {
                debug!(
                    "QueryEngine: column '{}' left without a plugin",
                    table.columns[col_idx].name
                );
                continue;
            };
            let plugin = self.bind_plugin(&table.columns[col_idx], &type_name)?;

            for row in table.rows.iter_mut() {
                if let Some(cell) = row.get_mut(col_idx) {
                    *cell = plugin.parse_value(cell);
                }
            }

            let column = &mut table.columns[col_idx];
            debug!(
                "QueryEngine: column '{}' bound to '{}'",
                column.name,
                plugin.name()
            );
            column.type_name = Some(type_name);
            column.plugin = Some(plugin);
        }

        for (col_idx, column) in table.columns.iter().enumerate() {
            if column.unique {
                Self::check_unique(&table, col_idx)?;
            }
        }

        table.refresh_null_counts();
        info!(
            "QueryEngine: imported {} rows x {} columns",
            table.row_count(),
            table.column_count()
        );

        self.table = table;
        self.imported = true;
        if self.config.index.auto_build {
            self.create_data_index();
        }
        Ok(())
    }

    /// Import decoded JSON objects; non-object entries are skipped
    pub fn import_json(&mut self, records: &[JsonValue], options: ImportOptions) -> Result<()> {
        let rows: Vec<RawRow> = records
            .iter()
            .filter_map(JsonValue::as_object)
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), json_value_to_data_value(value)))
                    .collect()
            })
            .collect();
        self.import_data(rows, options)
    }

    fn bind_plugin(&self, column: &DataColumn, type_name: &str) -> Result<Arc<dyn TypePlugin>> {
        let plugin =
            self.registry
                .resolve(type_name)
                .ok_or_else(|| QueryError::UnresolvedPlugin {
                    column: column.name.clone(),
                    type_name: type_name.to_string(),
                })?;

        match (&column.values, type_name) {
            (Some(values), "enum") => Ok(Arc::new(EnumPlugin::with_values(values.clone()))),
            _ => Ok(plugin),
        }
    }

    fn check_unique(table: &DataTable, col_idx: usize) -> Result<()> {
        let mut seen = HashSet::new();
        for row in &table.rows {
            let value = row.get(col_idx).unwrap_or(&DataValue::Null);
            if !value.is_null() && !seen.insert(IndexKey::from(value)) {
                return Err(QueryError::DuplicateValue {
                    column: table.columns[col_idx].name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build secondary indices for every column
    pub fn create_data_index(&mut self) {
        self.index = DataIndex::build(&self.table);
    }

    fn parser(&self) -> QueryParser<'_> {
        QueryParser::new(&self.table.columns, &self.config.fields)
    }

    fn resolve_column(&self, field: &str) -> Result<usize> {
        self.parser()
            .resolve_field(field)
            .ok_or_else(|| QueryError::ColumnNotFound(field.to_string()))
    }

    pub fn query(&self, text: &str) -> Result<QueryResult> {
        self.query_with_diagnostics(text).map(|report| report.result)
    }

    pub fn query_with_diagnostics(&self, text: &str) -> Result<QueryReport> {
        if text.trim().is_empty() {
            return Ok(QueryReport {
                result: QueryResult::Rows(self.all_rows()),
                diagnostics: Vec::new(),
            });
        }
        crate::trace_query!(text);
        let parsed = self.parser().parse(text)?;
        Ok(self.execute(parsed))
    }

    fn all_rows(&self) -> CandidateSet {
        (0..self.table.row_count()).collect()
    }

    fn stage(&self, stage: QueryStage, rows: usize) {
        debug!("QueryEngine: {:?} ({} rows)", stage, rows);
    }

    fn execute(&self, mut parsed: ParsedQuery) -> QueryReport {
        let mut diagnostics = std::mem::take(&mut parsed.diagnostics);
        let mut candidates = self.all_rows();
        self.stage(QueryStage::Parsed, candidates.len());

        for select in parsed.selects() {
            let Some(col_idx) = self.table.get_column_index(&select.field) else {
                continue;
            };
            if let Some(plugin) = self.table.columns[col_idx].plugin() {
                plugin.evaluate(
                    select,
                    col_idx,
                    self.index.column(col_idx),
                    &self.table,
                    &mut candidates,
                );
            }
        }
        self.stage(QueryStage::Filtered, candidates.len());

        let mut ordered: Vec<usize> = candidates.iter().copied().collect();
        if let Some(range) = parsed.range() {
            ordered = match range.resolve(ordered.len()) {
                Some((start, end)) => ordered[start..=end].to_vec(),
                None => Vec::new(),
            };
            self.stage(QueryStage::RangeApplied, ordered.len());
        }

        if let Some(group) = parsed.group() {
            if let Some(fuzzy) = parsed.fuzzy() {
                diagnostics.push(ParseDiagnostic::new(
                    DiagnosticKind::SearchWithGroup,
                    fuzzy.to_string(),
                    "groups are returned without search",
                ));
            }
            if let Some(sort) = parsed.sort() {
                diagnostics.push(ParseDiagnostic::new(
                    DiagnosticKind::SortWithGroup,
                    sort.to_string(),
                    "groups are returned unsorted",
                ));
            }
            let groups = self.apply_group(&ordered, group);
            self.stage(QueryStage::GroupApplied, ordered.len());
            let result = QueryResult::Grouped(groups);
            self.stage(QueryStage::Done, result.len());
            return QueryReport {
                result,
                diagnostics,
            };
        }

        if let Some(fuzzy) = parsed.fuzzy() {
            ordered = self.apply_search(ordered, fuzzy);
            self.stage(QueryStage::FuzzyApplied, ordered.len());
        }

        let result = if let Some(sort) = parsed.sort() {
            self.apply_sort(&mut ordered, sort);
            self.stage(QueryStage::Sorted, ordered.len());
            QueryResult::Ordered(ordered)
        } else if parsed.range().is_some() {
            QueryResult::Ordered(ordered)
        } else {
            QueryResult::Rows(ordered.into_iter().collect())
        };

        self.stage(QueryStage::Done, result.len());
        QueryReport {
            result,
            diagnostics,
        }
    }

    fn apply_search(&self, rows: Vec<usize>, fuzzy: &FuzzyClause) -> Vec<usize> {
        match self.config.search.mode {
            SearchMode::Substring => {
                let needle = fuzzy.text.to_lowercase();
                rows.into_iter()
                    .filter(|&row| {
                        self.row_cells(row)
                            .any(|cell| cell.to_lowercase().contains(&needle))
                    })
                    .collect()
            }
            SearchMode::Fuzzy => {
                let matcher = SkimMatcherV2::default().ignore_case();
                let threshold = self.config.search.fuzzy_threshold;
                rows.into_iter()
                    .filter(|&row| {
                        self.row_cells(row).any(|cell| {
                            matcher
                                .fuzzy_match(&cell, &fuzzy.text)
                                .map_or(false, |score| score > threshold)
                        })
                    })
                    .collect()
            }
        }
    }

    fn row_cells(&self, row: usize) -> impl Iterator<Item = String> + '_ {
        self.table
            .rows
            .get(row)
            .into_iter()
            .flat_map(|r| r.values.iter().map(|value| value.to_string()))
    }

    fn apply_group(&self, rows: &[usize], group: &GroupClause) -> Vec<GroupEntry> {
        let Some(col_idx) = self.table.get_column_index(&group.field) else {
            return Vec::new();
        };

        // key -> position in `groups`, which keeps first-seen order
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<GroupEntry> = Vec::new();
        for &row in rows {
            let key = self
                .table
                .get_value(row, col_idx)
                .map(|value| value.to_string())
                .unwrap_or_default();
            match positions.get(&key) {
                Some(&pos) => groups[pos].rows.push(row),
                None => {
                    positions.insert(key.clone(), groups.len());
                    groups.push(GroupEntry {
                        key,
                        rows: vec![row],
                    });
                }
            }
        }
        groups
    }

    fn apply_sort(&self, rows: &mut [usize], sort: &SortClause) {
        let Some(col_idx) = self.table.get_column_index(&sort.field) else {
            return;
        };
        let plugin = self.table.columns[col_idx].plugin();
        let null = DataValue::Null;

        // sort_by is stable, so ties stay in position order both ways
        rows.sort_by(|&a, &b| {
            let va = self.table.get_value(a, col_idx).unwrap_or(&null);
            let vb = self.table.get_value(b, col_idx).unwrap_or(&null);
            let ordering = match plugin {
                Some(plugin) => plugin.compare(va, vb),
                None => compare_datavalues(va, vb),
            };
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    fn validated_select(&self, field: &str, operator: Operator, value: &str) -> Result<SelectClause> {
        let column = &self.table.columns[self.resolve_column(field)?];
        let plugin = column
            .plugin()
            .ok_or_else(|| QueryError::UnboundColumn(column.name.clone()))?;

        let reason = if !plugin.supports(operator) {
            Some(format!("operator '{}' is not supported", operator))
        } else if !plugin.validate_operand(operator, value) {
            Some(format!("'{}' is not a valid value for '{}'", value, operator))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(QueryError::InvalidValue {
                column: column.name.clone(),
                type_name: plugin.name().to_string(),
                reason,
                allowed: Operator::list(plugin.operators()),
            }),
            None => Ok(SelectClause {
                field: column.name.clone(),
                operator,
                value: value.to_string(),
            }),
        }
    }

    pub fn add_select(&mut self, field: &str, operator: Operator, value: &str) -> Result<()> {
        let select = self.validated_select(field, operator, value)?;
        self.builder.add_select(select);
        Ok(())
    }

    /// Replace every select on `field` with a single new one
    pub fn set_select(&mut self, field: &str, operator: Operator, value: &str) -> Result<()> {
        let select = self.validated_select(field, operator, value)?;
        self.builder.set_select(select);
        Ok(())
    }

    /// Remove selects on `field`, narrowed by operator and/or value when
    /// given. Returns how many were removed.
    pub fn remove_select(
        &mut self,
        field: &str,
        operator: Option<Operator>,
        value: Option<&str>,
    ) -> usize {
        let field = match self.resolve_column(field) {
            Ok(col_idx) => self.table.columns[col_idx].name.clone(),
            Err(_) => field.to_string(),
        };
        self.builder.remove_select(&field, operator, value)
    }

    pub fn set_sort(&mut self, field: &str, direction: SortDirection) -> Result<()> {
        let column = &self.table.columns[self.resolve_column(field)?];
        if !column.sortable {
            return Err(QueryError::NotSortable(column.name.clone()));
        }
        let sort = SortClause {
            field: column.name.clone(),
            direction,
        };
        self.builder.set_sort(sort);
        Ok(())
    }

    pub fn remove_sort(&mut self) {
        self.builder.remove_sort();
    }

    pub fn set_range(&mut self, range: RangeClause) {
        self.builder.set_range(range);
    }

    pub fn remove_range(&mut self) {
        self.builder.remove_range();
    }

    pub fn set_group(&mut self, field: &str) -> Result<()> {
        let column = &self.table.columns[self.resolve_column(field)?];
        if !column.groupable {
            return Err(QueryError::NotGroupable(column.name.clone()));
        }
        let group = GroupClause {
            field: column.name.clone(),
        };
        self.builder.set_group(group);
        Ok(())
    }

    pub fn remove_group(&mut self) {
        self.builder.remove_group();
    }

    pub fn set_search(&mut self, text: &str) {
        if text.trim().is_empty() {
            self.builder.remove_search();
        } else {
            self.builder.set_search(FuzzyClause {
                text: text.to_string(),
            });
        }
    }

    pub fn remove_search(&mut self) {
        self.builder.remove_search();
    }

    pub fn clear_query(&mut self) {
        self.builder.clear();
    }

    /// The builder's query as text
    pub fn current_query(&self) -> String {
        self.builder.to_query_string()
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    /// Serialise the builder, parse it again and execute from scratch
    pub fn run_current_query(&self) -> Result<QueryResult> {
        self.query(&self.current_query())
    }

    /// Overwrite one cell and keep that column's index in step
    pub fn alter_data(&mut self, pos: usize, column: &str, value: DataValue) -> Result<()> {
        let col_idx = self.resolve_column(column)?;
        if pos >= self.table.row_count() {
            return Err(QueryError::RowNotFound(pos));
        }

        let header = &self.table.columns[col_idx];
        if !header.editable {
            return Err(QueryError::NotEditable(header.name.clone()));
        }

        let canonical = match header.plugin() {
            Some(plugin) => {
                if let DataValue::String(raw) = &value {
                    if !raw.trim().is_empty() && !plugin.validate(raw) {
                        return Err(QueryError::InvalidValue {
                            column: header.name.clone(),
                            type_name: plugin.name().to_string(),
                            reason: format!("'{}' is not a valid value", raw),
                            allowed: Operator::list(plugin.operators()),
                        });
                    }
                }
                plugin.parse_value(&value)
            }
            None => value,
        };

        if header.unique && !canonical.is_null() {
            let taken = match self.index.column(col_idx) {
                Some(index) => index
                    .rows_for(&canonical)
                    .map_or(false, |rows| rows.iter().any(|&row| row != pos)),
                None => {
                    let key = IndexKey::from(&canonical);
                    self.table.rows.iter().any(|row| {
                        row.id != pos
                            && row
                                .get(col_idx)
                                .map_or(false, |other| IndexKey::from(other) == key)
                    })
                }
            };
            if taken {
                return Err(QueryError::DuplicateValue {
                    column: header.name.clone(),
                    value: canonical.to_string(),
                });
            }
        }

        let Some(cell) = self.table.rows[pos].get_mut(col_idx) else {
            return Err(QueryError::RowNotFound(pos));
        };
        let old = std::mem::replace(cell, canonical.clone());
        debug!(
            "QueryEngine: row {} column '{}': '{}' -> '{}'",
            pos, self.table.columns[col_idx].name, old, canonical
        );

        if !self.index.is_empty() {
            self.index.move_row(col_idx, pos, &old, &canonical);
        }
        let column = &mut self.table.columns[col_idx];
        match (old.is_null(), canonical.is_null()) {
            (true, false) => column.null_count = column.null_count.saturating_sub(1),
            (false, true) => column.null_count += 1,
            _ => {}
        }
        Ok(())
    }

    pub fn get_header(&self, column: &str) -> Option<&DataColumn> {
        let col_idx = self.parser().resolve_field(column)?;
        self.table.columns.get(col_idx)
    }

    pub fn get_columns(&self) -> &[DataColumn] {
        &self.table.columns
    }

    pub fn get_data(&self, pos: usize) -> Option<&DataRow> {
        self.table.rows.get(pos)
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    /// Read-only view of one column's index, `None` before it is built
    pub fn column_index(&self, column: &str) -> Option<&ColumnIndex> {
        let col_idx = self.parser().resolve_field(column)?;
        self.index.column(col_idx)
    }

    /// Rows of a result in result order
    pub fn resolve_rows(&self, result: &QueryResult) -> Vec<&DataRow> {
        result
            .row_ids()
            .into_iter()
            .filter_map(|pos| self.table.rows.get(pos))
            .collect()
    }
}
