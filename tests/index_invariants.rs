use grid_query::data::query_engine::{HeaderSpec, ImportOptions, QueryEngine, RawRow};
use grid_query::{CandidateSet, DataValue, EngineConfig, QueryError, QueryResult};

fn inventory(config: EngineConfig) -> QueryEngine {
    let rows: Vec<RawRow> = [
        ("A-1", "red", 10),
        ("A-2", "blue", 4),
        ("B-1", "red", 4),
        ("B-2", "green", 0),
        ("C-1", "blue", 12),
    ]
    .into_iter()
    .map(|(sku, colour, qty)| {
        vec![
            ("sku".to_string(), DataValue::from(sku)),
            ("colour".to_string(), DataValue::from(colour)),
            ("qty".to_string(), DataValue::Integer(qty)),
        ]
    })
    .collect();

    let mut engine = QueryEngine::with_config(config);
    engine
        .import_data(
            rows,
            ImportOptions {
                headers: vec![
                    HeaderSpec::new("sku").with_type("string").unique(true),
                    HeaderSpec::new("colour")
                        .with_type("enum")
                        .with_values(vec!["red".into(), "green".into(), "blue".into()]),
                    HeaderSpec::new("qty").with_type("number"),
                ],
                auto_detect: false,
            },
        )
        .unwrap();
    engine
}

fn assert_partitions(engine: &QueryEngine) {
    for column in engine.get_columns() {
        let index = engine.column_index(&column.name).unwrap();
        assert!(
            index.is_partition_of(engine.row_count()),
            "index of '{}' no longer partitions the rows",
            column.name
        );
    }
}

#[test]
fn test_index_built_on_import() {
    let engine = inventory(EngineConfig::default());
    assert_partitions(&engine);
    let qty = engine.column_index("qty").unwrap();
    assert_eq!(qty.distinct_count(), 4);
    assert_eq!(
        qty.rows_for(&DataValue::Integer(4)).cloned(),
        Some([1, 2].into_iter().collect())
    );
}

#[test]
fn test_index_built_on_demand() {
    let mut config = EngineConfig::default();
    config.index.auto_build = false;
    let mut engine = inventory(config);
    assert!(engine.column_index("qty").is_none());

    // Queries still work by scanning candidates
    assert_eq!(
        engine.query("qty == 4").unwrap(),
        QueryResult::Rows(CandidateSet::from([1, 2]))
    );

    engine.create_data_index();
    assert_partitions(&engine);
    assert_eq!(
        engine.query("qty == 4").unwrap(),
        QueryResult::Rows(CandidateSet::from([1, 2]))
    );
}

#[test]
fn test_round_trip_edit() {
    let mut engine = inventory(EngineConfig::default());
    assert!(engine.query("qty == 4").unwrap().contains(2));

    engine.alter_data(2, "qty", DataValue::from("7")).unwrap();

    assert_eq!(engine.get_data(2).unwrap().values[2], DataValue::Integer(7));
    assert!(engine.query("qty == 7").unwrap().contains(2));
    assert!(!engine.query("qty == 4").unwrap().contains(2));
    assert_partitions(&engine);
}

#[test]
fn test_edit_leaves_other_columns_and_results_alone() {
    let mut engine = inventory(EngineConfig::default());
    let before = engine.query("colour == red").unwrap();
    let colour_buckets = engine.column_index("colour").unwrap().distinct_count();

    engine.alter_data(0, "qty", DataValue::Integer(99)).unwrap();

    assert_eq!(before, QueryResult::Rows(CandidateSet::from([0, 2])));
    assert_eq!(engine.query("colour == red").unwrap(), before);
    assert_eq!(
        engine.column_index("colour").unwrap().distinct_count(),
        colour_buckets
    );
}

#[test]
fn test_edit_canonicalises_through_plugin() {
    let mut engine = inventory(EngineConfig::default());
    engine
        .alter_data(3, "Colour", DataValue::from("BLUE"))
        .unwrap();
    assert_eq!(
        engine.get_data(3).unwrap().values[1],
        DataValue::String("blue".into())
    );
    assert_eq!(
        engine.query("colour == blue").unwrap(),
        QueryResult::Rows(CandidateSet::from([1, 3, 4]))
    );
}

#[test]
fn test_clearing_a_cell() {
    let mut engine = inventory(EngineConfig::default());
    engine.alter_data(4, "qty", DataValue::from("")).unwrap();
    assert_eq!(engine.get_data(4).unwrap().values[2], DataValue::Null);
    assert_eq!(engine.get_header("qty").unwrap().null_count, 1);
    assert_eq!(
        engine.query("sort qty").unwrap(),
        QueryResult::Ordered(vec![4, 3, 1, 2, 0])
    );
    assert_partitions(&engine);
}

#[test]
fn test_edit_errors() {
    let mut engine = inventory(EngineConfig::default());

    assert_eq!(
        engine.alter_data(9, "qty", DataValue::Integer(1)).unwrap_err(),
        QueryError::RowNotFound(9)
    );
    assert_eq!(
        engine
            .alter_data(0, "weight", DataValue::Integer(1))
            .unwrap_err(),
        QueryError::ColumnNotFound("weight".into())
    );
    assert!(matches!(
        engine.alter_data(0, "qty", DataValue::from("lots")),
        Err(QueryError::InvalidValue { .. })
    ));
    assert!(matches!(
        engine.alter_data(0, "colour", DataValue::from("purple")),
        Err(QueryError::InvalidValue { .. })
    ));
    assert_eq!(
        engine
            .alter_data(0, "sku", DataValue::from("B-2"))
            .unwrap_err(),
        QueryError::DuplicateValue {
            column: "sku".into(),
            value: "B-2".into()
        }
    );
    // Writing a row's own value back is not a duplicate
    engine.alter_data(0, "sku", DataValue::from("A-1")).unwrap();

    assert_eq!(engine.get_data(0).unwrap().values[2], DataValue::Integer(10));
    assert_partitions(&engine);
}

#[test]
fn test_unique_check_follows_edits() {
    for auto_build in [true, false] {
        let mut config = EngineConfig::default();
        config.index.auto_build = auto_build;
        let mut engine = inventory(config);

        engine.alter_data(0, "sku", DataValue::from("Z-9")).unwrap();
        // A-1 was released by the previous edit
        engine.alter_data(1, "sku", DataValue::from("A-1")).unwrap();
        assert_eq!(
            engine
                .alter_data(2, "sku", DataValue::from("Z-9"))
                .unwrap_err(),
            QueryError::DuplicateValue {
                column: "sku".into(),
                value: "Z-9".into()
            }
        );
        assert_eq!(
            engine.query("sku == A-1").unwrap(),
            QueryResult::Rows(CandidateSet::from([1]))
        );
    }
}

#[test]
fn test_read_only_column() {
    let mut engine = QueryEngine::new();
    engine
        .import_data(
            vec![vec![("id".to_string(), DataValue::Integer(1))]],
            ImportOptions {
                headers: vec![HeaderSpec::new("id").editable(false)],
                auto_detect: true,
            },
        )
        .unwrap();
    assert_eq!(
        engine.alter_data(0, "id", DataValue::Integer(2)).unwrap_err(),
        QueryError::NotEditable("id".into())
    );
}
