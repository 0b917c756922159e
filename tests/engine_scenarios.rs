use grid_query::data::query_engine::{HeaderSpec, ImportOptions, QueryEngine, RawRow};
use grid_query::{
    CandidateSet, DataValue, DiagnosticKind, EngineConfig, GroupEntry, QueryError, QueryResult,
};
use serde_json::json;

fn people() -> QueryEngine {
    let mut engine = QueryEngine::new();
    engine
        .import_json(
            &[
                json!({"name": "Amy", "age": 30}),
                json!({"name": "Bo", "age": 25}),
                json!({"name": "Cy", "age": 30}),
            ],
            ImportOptions::default(),
        )
        .unwrap();
    engine
}

fn row(pairs: &[(&str, DataValue)]) -> RawRow {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn staff() -> QueryEngine {
    let rows = vec![
        row(&[
            ("id", 1i64.into()),
            ("name", "Alice".into()),
            ("city", "New York".into()),
            ("level", "high".into()),
            ("joined", "2021-03-04".into()),
            ("active", "yes".into()),
        ]),
        row(&[
            ("id", 2i64.into()),
            ("name", "bob".into()),
            ("city", "London".into()),
            ("level", "Low".into()),
            ("joined", "2019-11-20".into()),
            ("active", "no".into()),
        ]),
        row(&[
            ("id", 3i64.into()),
            ("name", "Carol".into()),
            ("city", "new york".into()),
            ("level", "medium".into()),
            ("joined", "2023-01-15".into()),
        ]),
        row(&[
            ("id", 4i64.into()),
            ("name", "Dan".into()),
            ("city", "Paris".into()),
            ("level", "LOW".into()),
            ("joined", "2020-06-30".into()),
            ("active", "true".into()),
        ]),
    ];
    let headers = vec![
        HeaderSpec::new("id").with_type("number").unique(true).editable(false),
        HeaderSpec::new("level")
            .with_type("enum")
            .with_values(vec!["Low".into(), "Medium".into(), "High".into()]),
        HeaderSpec::new("joined").with_type("date"),
        HeaderSpec::new("active").with_type("boolean").groupable(false),
    ];

    let mut engine = QueryEngine::new();
    engine
        .import_data(
            rows,
            ImportOptions {
                headers,
                auto_detect: true,
            },
        )
        .unwrap();
    engine
}

#[test]
fn scenario_a_equality_filter() {
    let engine = people();
    assert_eq!(
        engine.query("age == 30").unwrap(),
        QueryResult::Rows(CandidateSet::from([0, 2]))
    );
}

#[test]
fn scenario_b_sort_ascending() {
    let engine = people();
    assert_eq!(
        engine.query("sort age asc").unwrap(),
        QueryResult::Ordered(vec![1, 0, 2])
    );
}

#[test]
fn scenario_c_conjunction() {
    let engine = people();
    assert_eq!(
        engine.query("age >= 26 and name %= A").unwrap(),
        QueryResult::Rows(CandidateSet::from([0]))
    );
}

#[test]
fn scenario_d_range() {
    let engine = people();
    assert_eq!(
        engine.query("range 1-2").unwrap(),
        QueryResult::Ordered(vec![0, 1])
    );
}

#[test]
fn scenario_e_group() {
    let engine = people();
    assert_eq!(
        engine.query("group age").unwrap(),
        QueryResult::Grouped(vec![
            GroupEntry {
                key: "30".into(),
                rows: vec![0, 2]
            },
            GroupEntry {
                key: "25".into(),
                rows: vec![1]
            },
        ])
    );
}

#[test]
fn test_descending_sort_keeps_ties_in_position_order() {
    let engine = people();
    assert_eq!(
        engine.query("sort age desc").unwrap(),
        QueryResult::Ordered(vec![0, 2, 1])
    );
}

#[test]
fn test_range_counts_from_first_surviving_row() {
    let engine = staff();
    // Rows 1 and 3 survive the filter; position 2 of that list is row 3
    assert_eq!(
        engine.query("id > 1 and name !*= carol and range 2-2").unwrap(),
        QueryResult::Ordered(vec![3])
    );
    assert_eq!(
        engine.query("id >= 2 and range 2-").unwrap(),
        QueryResult::Ordered(vec![2, 3])
    );
    assert_eq!(
        engine.query("range -1").unwrap(),
        QueryResult::Ordered(vec![3])
    );
    assert!(engine.query("id > 100 and range 1").unwrap().is_empty());
}

#[test]
fn test_range_then_sort() {
    let engine = staff();
    assert_eq!(
        engine.query("range 1-3 and sort name desc").unwrap(),
        QueryResult::Ordered(vec![2, 1, 0])
    );
}

#[test]
fn test_typed_columns() {
    let engine = staff();
    assert_eq!(
        engine.get_header("city").unwrap().type_name.as_deref(),
        Some("string")
    );
    assert_eq!(
        engine.get_data(0).unwrap().values[1],
        DataValue::String("High".into())
    );
    assert_eq!(
        engine.query("joined > 2020-12-31").unwrap(),
        QueryResult::Rows(CandidateSet::from([0, 2]))
    );
    assert_eq!(
        engine.query("joined >< 2019-01-01,2020-12-31").unwrap(),
        QueryResult::Rows(CandidateSet::from([1, 3]))
    );
    assert_eq!(
        engine.query("active == true").unwrap(),
        QueryResult::Rows(CandidateSet::from([0, 3]))
    );
    assert_eq!(
        engine.query("level in low, medium").unwrap(),
        QueryResult::Rows(CandidateSet::from([1, 2, 3]))
    );
    assert_eq!(
        engine.query("sort level desc").unwrap(),
        QueryResult::Ordered(vec![0, 2, 1, 3])
    );
}

#[test]
fn test_quoted_value_with_spaces() {
    let engine = staff();
    assert_eq!(
        engine.query(r#"city == "New York""#).unwrap(),
        QueryResult::Rows(CandidateSet::from([0, 2]))
    );
    assert_eq!(
        engine.query(r"city == new\ york && name %= c").unwrap(),
        QueryResult::Rows(CandidateSet::from([2]))
    );
}

#[test]
fn test_search_any_column() {
    let engine = staff();
    assert_eq!(
        engine.query("search YORK").unwrap(),
        QueryResult::Rows(CandidateSet::from([0, 2]))
    );
    assert_eq!(
        engine.query("search 2019").unwrap(),
        QueryResult::Rows(CandidateSet::from([1]))
    );
}

#[test]
fn test_fuzzy_search_mode() {
    let mut config = EngineConfig::default();
    config.search.mode = grid_query::config::SearchMode::Fuzzy;
    let mut engine = QueryEngine::with_config(config);
    engine
        .import_json(
            &[
                json!({"city": "Amsterdam"}),
                json!({"city": "London"}),
                json!({"city": "Madrid"}),
            ],
            ImportOptions::default(),
        )
        .unwrap();

    let result = engine.query("search amstdm").unwrap();
    assert_eq!(result, QueryResult::Rows(CandidateSet::from([0])));
}

#[test]
fn test_group_ignores_search() {
    let engine = people();
    let report = engine
        .query_with_diagnostics("group age and search Amy")
        .unwrap();
    assert_eq!(
        report.result,
        QueryResult::Grouped(vec![
            GroupEntry {
                key: "30".into(),
                rows: vec![0, 2]
            },
            GroupEntry {
                key: "25".into(),
                rows: vec![1]
            },
        ])
    );
    let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::SearchWithGroup]);

    let result = engine.query("search york and group city").unwrap();
    assert_eq!(result.group("London"), Some(&[1][..]));
    assert_eq!(result.group("Paris"), Some(&[3][..]));
}

#[test]
fn test_range_then_group_on_filtered_rows() {
    let engine = staff();
    // Rows 1, 2, 3 survive the filter; the range keeps the first two of them
    assert_eq!(
        engine.query("id > 1 and range 1-2 and group level").unwrap(),
        QueryResult::Grouped(vec![
            GroupEntry {
                key: "Low".into(),
                rows: vec![1]
            },
            GroupEntry {
                key: "Medium".into(),
                rows: vec![2]
            },
        ])
    );
}

#[test]
fn test_diagnostics_do_not_abort_query() {
    let engine = staff();
    let report = engine
        .query_with_diagnostics("salary > 5 and id > 2 and group active")
        .unwrap();
    assert_eq!(report.result, QueryResult::Rows(CandidateSet::from([2, 3])));
    let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::UnknownField, DiagnosticKind::NotGroupable]
    );
}

#[test]
fn test_unbound_columns_without_auto_detect() {
    let mut engine = QueryEngine::new();
    engine
        .import_data(
            vec![
                row(&[("name", "Amy".into()), ("age", 30i64.into())]),
                row(&[("name", "Bo".into())]),
            ],
            ImportOptions {
                headers: vec![HeaderSpec::new("name").with_type("string")],
                auto_detect: false,
            },
        )
        .unwrap();

    assert!(engine.get_header("age").unwrap().plugin().is_none());
    assert_eq!(engine.get_data(1).unwrap().values[1], DataValue::Null);
    assert_eq!(
        engine.query("age == 30").unwrap_err(),
        QueryError::UnboundColumn("age".into())
    );
    // Sorting an unbound column falls back to generic value ordering
    assert_eq!(
        engine.query("sort age").unwrap(),
        QueryResult::Ordered(vec![1, 0])
    );
}

#[test]
fn test_import_errors() {
    let mut engine = QueryEngine::new();
    let err = engine
        .import_data(
            vec![row(&[("cost", 3i64.into())])],
            ImportOptions {
                headers: vec![HeaderSpec::new("cost").with_type("currency")],
                auto_detect: true,
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::UnresolvedPlugin {
            column: "cost".into(),
            type_name: "currency".into()
        }
    );

    let err = engine
        .import_data(
            vec![row(&[("id", 1i64.into())]), row(&[("id", "1".into())])],
            ImportOptions {
                headers: vec![HeaderSpec::new("id").with_type("number").unique(true)],
                auto_detect: true,
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::DuplicateValue {
            column: "id".into(),
            value: "1".into()
        }
    );

    // Failed imports leave the engine empty and open for another attempt
    assert_eq!(engine.row_count(), 0);
    engine
        .import_data(vec![row(&[("id", 1i64.into())])], ImportOptions::default())
        .unwrap();
    assert_eq!(engine.row_count(), 1);
}

#[test]
fn test_custom_plugin_before_import() {
    let mut engine = QueryEngine::new();
    engine
        .register_plugin(
            "currency",
            std::sync::Arc::new(grid_query::plugins::NumberPlugin),
        )
        .unwrap();
    engine
        .import_data(
            vec![row(&[("cost", "12.50".into())]), row(&[("cost", "3".into())])],
            ImportOptions {
                headers: vec![HeaderSpec::new("cost").with_type("Currency")],
                auto_detect: true,
            },
        )
        .unwrap();
    assert_eq!(
        engine.query("cost > 5").unwrap(),
        QueryResult::Rows(CandidateSet::from([0]))
    );
}

#[test]
fn test_resolve_rows_follows_result_order() {
    let engine = people();
    let result = engine.query("sort name desc").unwrap();
    let names: Vec<String> = engine
        .resolve_rows(&result)
        .iter()
        .map(|r| r.values[0].to_string())
        .collect();
    assert_eq!(names, vec!["Cy", "Bo", "Amy"]);
}
