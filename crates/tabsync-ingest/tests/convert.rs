//! Integration tests for text-to-typed conversion.

use tabsync_ingest::{ConvertError, RowPositions, convert_batch, convert_row, convert_snapshot};
use tabsync_model::{
    DatabaseSchema, Field, FieldType, Issue, IssueTally, Row, Snapshot, TableSchema, Value,
};

fn typed_schema() -> DatabaseSchema {
    let produce = TableSchema::new(
        "Produce",
        vec![
            Field::optional("produce_id", 1, FieldType::Int64),
            Field::optional("is_organic", 2, FieldType::Bool),
            Field::optional("wholesale_cost", 3, FieldType::Float),
            Field::optional("description", 4, FieldType::String),
        ],
    )
    .unwrap();
    DatabaseSchema::new("Grocery", vec![Field::table("produce", 7, produce)]).unwrap()
}

fn raw_row(raw: &TableSchema, values: &[(&str, &str)]) -> Row {
    Row::from_named(raw, values.iter().map(|&(name, text)| (name, Value::from(text)))).unwrap()
}

#[test]
fn boolean_literals() {
    let typed = typed_schema();
    let raw = typed.to_text_schema();
    let (_, raw_table) = raw.table("produce").unwrap();
    let (_, table) = typed.table("produce").unwrap();

    for (text, expected) in [("Y", Some(true)), ("N", Some(false)), ("y", None), ("true", None)] {
        let mut issues = Vec::new();
        let row = convert_row(
            &raw_row(raw_table, &[("is_organic", text)]),
            table,
            &mut |issue: Issue| issues.push(issue),
        )
        .unwrap();
        assert_eq!(row.get_by_number(2).and_then(Value::as_bool), expected, "{text}");
        assert_eq!(issues.len(), usize::from(expected.is_none()), "{text}");
    }
}

#[test]
fn empty_csv_value_is_absent_without_issue() {
    let typed = typed_schema();
    let (_, table) = typed.table("produce").unwrap();
    let mut tally = IssueTally::new();
    let row = convert_row(&Row::new(), table, &mut tally).unwrap();
    assert!(row.is_empty());
    assert!(tally.is_empty());
}

#[test]
fn snapshot_issues_are_tagged_with_table_id() {
    let typed = typed_schema();
    let raw = typed.to_text_schema();
    let (_, raw_table) = raw.table("produce").unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.push(
        "produce",
        raw_row(
            raw_table,
            &[("produce_id", "9000000000"), ("is_organic", "maybe"), ("wholesale_cost", "2.5")],
        ),
    );
    snapshot.push("produce", raw_row(raw_table, &[("description", "Kale")]));

    let mut tally = IssueTally::new();
    let converted = convert_snapshot(&snapshot, &raw, &typed, &mut tally).unwrap();

    let rows = converted.rows("produce");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_by_number(1), Some(&Value::Int64(9_000_000_000)));
    assert_eq!(rows[0].get_by_number(2), None);
    assert_eq!(rows[0].get_by_number(3), Some(&Value::Float(2.5)));
    assert_eq!(rows[1].get_by_number(4), Some(&Value::from("Kale")));

    let issues: Vec<_> = tally.iter().collect();
    assert_eq!(
        issues,
        vec![(&Issue::invalid_field_value(2, "maybe").with_table_id(7), 1)]
    );
}

#[test]
fn numeric_failure_names_table_and_row() {
    let typed = typed_schema();
    let raw = typed.to_text_schema();
    let (_, raw_table) = raw.table("produce").unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.push("produce", raw_row(raw_table, &[("produce_id", "1")]));
    snapshot.push("produce", raw_row(raw_table, &[("wholesale_cost", "cheap")]));

    let err = convert_snapshot(&snapshot, &raw, &typed, &mut IssueTally::new()).unwrap_err();
    let ConvertError::Record {
        table,
        record_index,
        source,
    } = err
    else {
        panic!("expected a record error");
    };
    assert_eq!((table.as_str(), record_index), ("produce", 2));
    assert!(matches!(*source, ConvertError::InvalidNumber { field_type: FieldType::Float, .. }));
}

#[test]
fn row_positions_continue_across_batches() {
    let typed = typed_schema();
    let raw = typed.to_text_schema();
    let (_, raw_table) = raw.table("produce").unwrap();
    let mut positions = RowPositions::new();

    let mut first = Snapshot::new();
    for id in ["1", "2", "3"] {
        first.push("produce", raw_row(raw_table, &[("produce_id", id)]));
    }
    convert_batch(&first, &raw, &typed, &mut positions, &mut IssueTally::new()).unwrap();
    assert_eq!(positions.converted("produce"), 3);

    let mut second = Snapshot::new();
    second.push("produce", raw_row(raw_table, &[("produce_id", "seven")]));
    let err = convert_batch(&second, &raw, &typed, &mut positions, &mut IssueTally::new())
        .unwrap_err();
    assert!(matches!(err, ConvertError::Record { record_index: 4, .. }));
    assert_eq!(err.to_string().split(':').next(), Some("table produce row 4"));
}

#[test]
fn enum_columns_are_not_converted_from_text() {
    let kind = std::sync::Arc::new(tabsync_model::EnumType::new("Kind", [("A", 1)]));
    let table = TableSchema::new("T", vec![Field::enumeration("kind", 1, kind)]).unwrap();
    let raw = table.to_text_schema();
    let err = convert_row(
        &raw_row(&raw, &[("kind", "A")]),
        &table,
        &mut tabsync_model::Discard,
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedType { field_type: FieldType::Enum, .. }));
}
