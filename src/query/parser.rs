use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::clause::{
    Clause, ClauseKind, FuzzyClause, GroupClause, RangeClause, SelectClause, SortClause,
    SortDirection,
};
use super::tokenizer::{Token, Tokenizer};
use crate::config::FieldConfig;
use crate::data::datatable::DataColumn;
use crate::error::{QueryError, Result};
use crate::plugins::Operator;

static RANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+)(-(-?\d+)?)?$").unwrap());

/// What went wrong with a sub-clause that was dropped (or replaced)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnrecognizedClause,
    UnknownField,
    UnknownOperator,
    InvalidValue,
    MissingArgument,
    InvalidRange,
    NotSortable,
    NotGroupable,
    /// A later sort/range/group/search replaced an earlier one
    DuplicateClause,
    /// Groups are returned unsorted
    SortWithGroup,
    /// Groups are returned without the search applied
    SearchWithGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    pub kind: DiagnosticKind,
    /// The offending sub-clause as written
    pub clause: String,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn new(kind: DiagnosticKind, clause: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            clause: clause.into(),
            message: message.into(),
        };
        warn!("QueryParser: {}", diagnostic);
        diagnostic
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in '{}': {}", self.kind, self.clause, self.message)
    }
}

/// Clauses of one query in the order they were written, plus diagnostics
/// for whatever was dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    pub clauses: Vec<Clause>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedQuery {
    pub fn selects(&self) -> impl Iterator<Item = &SelectClause> {
        self.clauses.iter().filter_map(|c| match c {
            Clause::Select(select) => Some(select),
            _ => None,
        })
    }

    pub fn sort(&self) -> Option<&SortClause> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Sort(sort) => Some(sort),
            _ => None,
        })
    }

    pub fn range(&self) -> Option<&RangeClause> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Range(range) => Some(range),
            _ => None,
        })
    }

    pub fn group(&self) -> Option<&GroupClause> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Group(group) => Some(group),
            _ => None,
        })
    }

    pub fn fuzzy(&self) -> Option<&FuzzyClause> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Fuzzy(fuzzy) => Some(fuzzy),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Text that parses back into the same clauses
    pub fn to_query_string(&self) -> String {
        self.clauses
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn push(&mut self, clause: Clause, source: &str) {
        let kind = clause.kind();
        if kind != ClauseKind::Select {
            if let Some(pos) = self.clauses.iter().position(|c| c.kind() == kind) {
                let replaced = self.clauses.remove(pos);
                self.diagnostics.push(ParseDiagnostic::new(
                    DiagnosticKind::DuplicateClause,
                    source,
                    format!("replaces earlier '{}'", replaced),
                ));
            }
        }
        self.clauses.push(clause);
    }
}

/// Parses query text against a fixed set of column headers
pub struct QueryParser<'a> {
    columns: &'a [DataColumn],
    fields: &'a FieldConfig,
}

impl<'a> QueryParser<'a> {
    pub fn new(columns: &'a [DataColumn], fields: &'a FieldConfig) -> Self {
        Self { columns, fields }
    }

    /// Match a query field name to a column, exact name first
    pub fn resolve_field(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.columns.iter().position(|c| c.name == name) {
            return Some(idx);
        }
        let wanted = self.fields.normalize(name);
        if wanted.is_empty() {
            return None;
        }
        self.columns
            .iter()
            .position(|c| self.fields.normalize(&c.name) == wanted)
    }

    /// Parse a whole query. Only a Select on a column without a type plugin
    /// is an error; every other problem drops the sub-clause with a
    /// diagnostic.
    pub fn parse(&self, input: &str) -> Result<ParsedQuery> {
        let tokens = Tokenizer::tokenize(input);
        let mut parsed = ParsedQuery::default();

        for group in tokens.split(|t| t.is_separator()) {
            if group.is_empty() {
                continue;
            }
            let source = group
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            match self.parse_clause(group, &source)? {
                Ok(clause) => parsed.push(clause, &source),
                Err(diagnostic) => parsed.diagnostics.push(diagnostic),
            }
        }

        debug!(
            "QueryParser: '{}' -> {} clauses, {} diagnostics",
            input,
            parsed.clauses.len(),
            parsed.diagnostics.len()
        );
        Ok(parsed)
    }

    fn parse_clause(
        &self,
        tokens: &[Token],
        source: &str,
    ) -> Result<std::result::Result<Clause, ParseDiagnostic>> {
        let args = &tokens[1..];
        let clause = match tokens[0].keyword().as_deref() {
            Some("search") => self.parse_search(args, source),
            Some("group") => self.parse_group(args, source),
            Some("range") => self.parse_range(args, source),
            Some("sort") => self.parse_sort(args, source),
            _ => return self.parse_select(tokens, source),
        };
        Ok(clause)
    }

    fn parse_search(
        &self,
        args: &[Token],
        source: &str,
    ) -> std::result::Result<Clause, ParseDiagnostic> {
        let text = join_tokens(args);
        if text.is_empty() {
            return Err(ParseDiagnostic::new(
                DiagnosticKind::MissingArgument,
                source,
                "search needs some text",
            ));
        }
        Ok(Clause::Fuzzy(FuzzyClause { text }))
    }

    fn parse_group(
        &self,
        args: &[Token],
        source: &str,
    ) -> std::result::Result<Clause, ParseDiagnostic> {
        let column = self.column_arg(args, source, "group")?;
        if !column.groupable {
            return Err(ParseDiagnostic::new(
                DiagnosticKind::NotGroupable,
                source,
                format!("column '{}' is not groupable", column.name),
            ));
        }
        Ok(Clause::Group(GroupClause {
            field: column.name.clone(),
        }))
    }

    fn parse_sort(
        &self,
        args: &[Token],
        source: &str,
    ) -> std::result::Result<Clause, ParseDiagnostic> {
        let column = self.column_arg(args, source, "sort")?;
        if !column.sortable {
            return Err(ParseDiagnostic::new(
                DiagnosticKind::NotSortable,
                source,
                format!("column '{}' is not sortable", column.name),
            ));
        }
        let direction = args
            .get(1)
            .and_then(|t| SortDirection::parse(&t.text))
            .unwrap_or(SortDirection::Asc);
        Ok(Clause::Sort(SortClause {
            field: column.name.clone(),
            direction,
        }))
    }

    fn parse_range(
        &self,
        args: &[Token],
        source: &str,
    ) -> std::result::Result<Clause, ParseDiagnostic> {
        let spec: String = args.iter().map(|t| t.text.as_str()).collect();
        if spec.is_empty() {
            return Err(ParseDiagnostic::new(
                DiagnosticKind::MissingArgument,
                source,
                "range needs bounds",
            ));
        }
        parse_range_spec(&spec)
            .map(Clause::Range)
            .ok_or_else(|| {
                ParseDiagnostic::new(
                    DiagnosticKind::InvalidRange,
                    source,
                    format!("'{}' is not a valid range (use N, A-B or A-)", spec),
                )
            })
    }

    fn parse_select(
        &self,
        tokens: &[Token],
        source: &str,
    ) -> Result<std::result::Result<Clause, ParseDiagnostic>> {
        if tokens.len() < 2 {
            return Ok(Err(ParseDiagnostic::new(
                DiagnosticKind::UnrecognizedClause,
                source,
                "expected '<field> <operator> <value>' or a keyword",
            )));
        }

        let Some(col_idx) = self.resolve_field(&tokens[0].text) else {
            return Ok(Err(ParseDiagnostic::new(
                DiagnosticKind::UnknownField,
                source,
                format!("no column named '{}'", tokens[0].text),
            )));
        };
        let column = &self.columns[col_idx];
        let plugin = column
            .plugin()
            .ok_or_else(|| QueryError::UnboundColumn(column.name.clone()))?;

        let operator = match Operator::parse(&tokens[1].text) {
            Some(op) if plugin.supports(op) => op,
            _ => {
                return Ok(Err(ParseDiagnostic::new(
                    DiagnosticKind::UnknownOperator,
                    source,
                    format!(
                        "'{}' is not an operator for {} column '{}' (allowed: {})",
                        tokens[1].text,
                        plugin.name(),
                        column.name,
                        Operator::list(plugin.operators())
                    ),
                )))
            }
        };

        if tokens.len() < 3 {
            return Ok(Err(ParseDiagnostic::new(
                DiagnosticKind::MissingArgument,
                source,
                format!("'{}' needs a value", operator),
            )));
        }

        let value = join_tokens(&tokens[2..]);
        if !plugin.validate_operand(operator, &value) {
            return Ok(Err(ParseDiagnostic::new(
                DiagnosticKind::InvalidValue,
                source,
                format!(
                    "'{}' is not a valid {} value for '{}'",
                    value,
                    plugin.name(),
                    operator
                ),
            )));
        }

        Ok(Ok(Clause::Select(SelectClause {
            field: column.name.clone(),
            operator,
            value,
        })))
    }

    fn column_arg(
        &self,
        args: &[Token],
        source: &str,
        keyword: &str,
    ) -> std::result::Result<&'a DataColumn, ParseDiagnostic> {
        let field = args.first().ok_or_else(|| {
            ParseDiagnostic::new(
                DiagnosticKind::MissingArgument,
                source,
                format!("{} needs a field", keyword),
            )
        })?;
        let columns = self.columns;
        self.resolve_field(&field.text)
            .map(|idx| &columns[idx])
            .ok_or_else(|| {
                ParseDiagnostic::new(
                    DiagnosticKind::UnknownField,
                    source,
                    format!("no column named '{}'", field.text),
                )
            })
    }
}

fn join_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `N`, `-N`, `A-B` or `A-`, 1-based, negative bounds counting from the end
pub fn parse_range_spec(spec: &str) -> Option<RangeClause> {
    let caps = RANGE_PATTERN.captures(spec)?;
    let lower: i64 = caps.get(1)?.as_str().parse().ok()?;
    if lower == 0 {
        return None;
    }

    // No dash after the first bound
    if caps.get(2).is_none() {
        return RangeClause::first(lower);
    }

    let upper = match caps.get(3) {
        Some(m) => {
            let upper: i64 = m.as_str().parse().ok()?;
            if upper == 0 || (lower > 0 && upper > 0 && lower > upper) {
                return None;
            }
            Some(upper)
        }
        None => None,
    };
    Some(RangeClause::between(lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{NumberPlugin, StringPlugin};
    use std::sync::Arc;

    fn columns() -> Vec<DataColumn> {
        let mut locked = DataColumn::new("notes").with_plugin(Arc::new(StringPlugin::default()));
        locked.sortable = false;
        locked.groupable = false;
        vec![
            DataColumn::new("first_name").with_plugin(Arc::new(StringPlugin::default())),
            DataColumn::new("age").with_plugin(Arc::new(NumberPlugin)),
            locked,
            DataColumn::new("raw"),
        ]
    }

    fn parse(input: &str) -> ParsedQuery {
        let columns = columns();
        let fields = FieldConfig::default();
        QueryParser::new(&columns, &fields).parse(input).unwrap()
    }

    #[test]
    fn test_select_with_multi_word_value() {
        let parsed = parse("FirstName == Mary  Ann");
        assert_eq!(
            parsed.clauses,
            vec![Clause::Select(SelectClause {
                field: "first_name".into(),
                operator: Operator::Equal,
                value: "Mary Ann".into(),
            })]
        );
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_keywords_and_separators() {
        let parsed = parse("age > 20 && SORT age DESC and range 2-3 AND search bo");
        assert_eq!(parsed.selects().count(), 1);
        assert_eq!(
            parsed.sort(),
            Some(&SortClause {
                field: "age".into(),
                direction: SortDirection::Desc
            })
        );
        assert_eq!(parsed.range(), Some(&RangeClause::between(2, Some(3))));
        assert_eq!(parsed.fuzzy().map(|f| f.text.as_str()), Some("bo"));
    }

    #[test]
    fn test_sort_direction_defaults_to_asc() {
        assert_eq!(parse("sort age").sort().unwrap().direction, SortDirection::Asc);
        assert_eq!(
            parse("sort age sideways").sort().unwrap().direction,
            SortDirection::Asc
        );
    }

    #[test]
    fn test_quoted_keyword_is_a_value() {
        let parsed = parse(r#"first_name == "and""#);
        assert_eq!(parsed.selects().next().unwrap().value, "and");
    }

    #[test]
    fn test_diagnostics_drop_sub_clauses() {
        let parsed = parse("height > 3 and age ~ 3 and age > old and age == and sort notes and group notes and range 0 and hello");
        let kinds: Vec<DiagnosticKind> = parsed.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::UnknownField,
                DiagnosticKind::UnknownOperator,
                DiagnosticKind::InvalidValue,
                DiagnosticKind::MissingArgument,
                DiagnosticKind::NotSortable,
                DiagnosticKind::NotGroupable,
                DiagnosticKind::InvalidRange,
                DiagnosticKind::UnrecognizedClause,
            ]
        );
        assert!(parsed.clauses.is_empty());
    }

    #[test]
    fn test_unsupported_operator_for_type() {
        let parsed = parse("age *= 3");
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::UnknownOperator);
        assert!(parsed.diagnostics[0].message.contains(">="));
    }

    #[test]
    fn test_duplicate_unique_clause_replaced() {
        let parsed = parse("sort age and sort first_name desc");
        assert_eq!(parsed.sort().unwrap().field, "first_name");
        assert_eq!(parsed.clauses.len(), 1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::DuplicateClause);
    }

    #[test]
    fn test_select_on_unbound_column_is_error() {
        let columns = columns();
        let fields = FieldConfig::default();
        let err = QueryParser::new(&columns, &fields)
            .parse("raw == x")
            .unwrap_err();
        assert_eq!(err, QueryError::UnboundColumn("raw".into()));
    }

    #[test]
    fn test_range_specs() {
        assert_eq!(parse_range_spec("5"), RangeClause::first(5));
        assert_eq!(parse_range_spec("-2"), RangeClause::first(-2));
        assert_eq!(parse_range_spec("3-"), Some(RangeClause::between(3, None)));
        assert_eq!(
            parse_range_spec("-3--1"),
            Some(RangeClause::between(-3, Some(-1)))
        );
        assert_eq!(parse_range_spec("0"), None);
        assert_eq!(parse_range_spec("4-2"), None);
        assert_eq!(parse_range_spec("a-b"), None);
    }

    #[test]
    fn test_serialised_query_parses_back() {
        let parsed = parse(r#"first_name *= "van der" and age >< 10,20 and sort age desc and range -3"#);
        assert!(parsed.diagnostics.is_empty());
        let reparsed = parse(&parsed.to_query_string());
        assert_eq!(reparsed.clauses, parsed.clauses);
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse("   and  ");
        assert!(parsed.is_empty());
        assert!(parsed.diagnostics.is_empty());
    }
}
