//! Integration tests for the relational mapper.

use std::sync::Arc;

use tabsync_model::{
    DatabaseSchema, EnumType, Field, FieldType, Row, Snapshot, TableSchema, Value,
};
use tabsync_store::{SqLite, SqMapper, StoreError};

fn produce_type() -> Arc<EnumType> {
    Arc::new(EnumType::new(
        "Type",
        [("APPLE", 1), ("ORANGE", 2), ("BROCCOLI", 3)],
    ))
}

fn produce() -> TableSchema {
    TableSchema::new(
        "Produce",
        vec![
            Field::optional("produce_id", 1, FieldType::Int32),
            Field::enumeration("type", 2, produce_type()),
            Field::optional("description", 3, FieldType::String),
            Field::optional("is_organic", 4, FieldType::Bool),
            Field::optional("retail_price", 5, FieldType::Double),
            Field::optional("wholesale_cost", 6, FieldType::Float),
            Field::optional("sku", 7, FieldType::Int64),
            Field::optional("photo", 8, FieldType::Bytes),
        ],
    )
    .unwrap()
}

fn grocery_store() -> DatabaseSchema {
    DatabaseSchema::new(
        "GroceryStore",
        vec![
            Field::table("fresh_produce", 1, produce()),
            Field::table("frozen_produce", 2, produce()),
        ],
    )
    .unwrap()
}

fn row(values: &[(&str, Value)]) -> Row {
    Row::from_named(&produce(), values.iter().cloned()).unwrap()
}

fn sample() -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.push(
        "fresh_produce",
        row(&[
            ("produce_id", Value::Int32(1)),
            ("type", Value::Enum(1)),
            ("description", Value::from("Honey Crisp")),
            ("is_organic", Value::Bool(true)),
            ("retail_price", Value::Double(3.49)),
            ("wholesale_cost", Value::Float(2.93)),
            ("sku", Value::Int64(9_000_000_001)),
            ("photo", Value::Bytes(vec![0, 159, 255])),
        ]),
    );
    snapshot.push(
        "fresh_produce",
        row(&[
            ("produce_id", Value::Int32(2)),
            ("type", Value::Enum(3)),
            ("is_organic", Value::Bool(false)),
            ("photo", Value::Bytes(Vec::new())),
        ]),
    );
    snapshot.push("frozen_produce", row(&[("description", Value::from("Peas"))]));
    snapshot
}

fn mapper() -> SqMapper {
    let mapper = SqMapper::new(SqLite::connect_in_memory().unwrap(), grocery_store());
    mapper.drop_and_create_tables().unwrap();
    mapper
}

#[test]
fn snapshot_round_trips_with_absent_fields() {
    let mapper = mapper();
    let snapshot = sample();
    assert_eq!(mapper.insert_snapshot(&snapshot).unwrap(), 3);
    assert_eq!(mapper.snapshot_all().unwrap(), snapshot);
}

#[test]
fn drop_and_create_is_idempotent() {
    let mapper = mapper();
    let once = mapper.db().schema().unwrap();
    mapper.drop_and_create_tables().unwrap();
    assert_eq!(mapper.db().schema().unwrap(), once);
}

#[test]
fn drop_and_create_discards_rows() {
    let mapper = mapper();
    mapper.insert_snapshot(&sample()).unwrap();
    mapper.drop_and_create_tables().unwrap();
    assert!(mapper.snapshot_all().unwrap().is_empty());
}

#[test]
fn partial_projection_reads_subset_schema() {
    let mapper = mapper();
    mapper.insert_snapshot(&sample()).unwrap();

    let margin = TableSchema::new(
        "Margin",
        vec![
            Field::optional("produce_id", 1, FieldType::Int32),
            Field::optional("margin_cents", 2, FieldType::Int32),
            Field::optional("description", 3, FieldType::String),
        ],
    )
    .unwrap();
    let sql = "select produce_id, \
               cast(round((retail_price - wholesale_cost) * 100) as integer) as MARGIN_CENTS \
               from fresh_produce where produce_id = 1";

    let columns = mapper.db().result_columns(sql).unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].column_type, "int");

    let rows = mapper.db().query_rows(sql, &margin).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_by_number(1), Some(&Value::Int32(1)));
    assert_eq!(rows[0].get_by_number(2), Some(&Value::Int32(56)));
    assert_eq!(rows[0].get_by_number(3), None);
}

#[test]
fn table_batches_count_tables() {
    let mapper = mapper();
    mapper.insert_snapshot(&sample()).unwrap();

    let batches: Vec<Snapshot> = mapper
        .snapshot(1)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].rows("fresh_produce").len(), 2);
    assert_eq!(batches[1].rows("frozen_produce").len(), 1);
}

#[test]
fn row_batches_are_bounded_and_span_tables() {
    let mapper = mapper();
    mapper.insert_snapshot(&sample()).unwrap();

    let batches: Vec<Snapshot> = mapper
        .snapshot_rows(2)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let sizes: Vec<usize> = batches.iter().map(Snapshot::row_count).collect();
    assert_eq!(sizes, vec![2, 1]);

    let mut merged = Snapshot::new();
    for batch in batches {
        merged.merge(batch);
    }
    assert_eq!(merged, sample());
}

#[test]
fn zero_batch_size_rejected() {
    let mapper = mapper();
    assert!(matches!(mapper.snapshot(0), Err(StoreError::InvalidBatchSize)));
    assert!(matches!(mapper.snapshot_rows(0), Err(StoreError::InvalidBatchSize)));
}

#[test]
fn unknown_snapshot_table_rejected() {
    let mapper = mapper();
    let mut snapshot = Snapshot::new();
    snapshot.push("canned_produce", Row::new());
    let err = mapper.insert_snapshot(&snapshot).unwrap_err();
    assert!(matches!(err, StoreError::UnknownTable { table } if table == "canned_produce"));
}

#[test]
fn explicit_transaction_is_left_to_caller() {
    let mapper = mapper();
    mapper.db().begin().unwrap();
    mapper.insert_snapshot(&sample()).unwrap();
    assert!(!mapper.db().is_autocommit());
    mapper.db().rollback().unwrap();
    assert!(mapper.snapshot_all().unwrap().is_empty());
}

#[test]
fn unknown_enum_number_in_store_fails_read() {
    let mapper = mapper();
    mapper
        .db()
        .execute_batch("insert into fresh_produce(produce_id, type) values (1, 9)")
        .unwrap();
    let err = mapper.snapshot_all().unwrap_err();
    assert!(matches!(err, StoreError::Read { table, .. } if table == "fresh_produce"));
}
