//! Property test: inserting a snapshot and reading it back is lossless.

use proptest::prelude::*;
use tabsync_model::{DatabaseSchema, Field, FieldType, Row, Snapshot, TableSchema, Value};
use tabsync_store::{SqLite, SqMapper};

fn item() -> TableSchema {
    TableSchema::new(
        "Item",
        vec![
            Field::optional("id", 1, FieldType::Int64),
            Field::optional("label", 2, FieldType::String),
            Field::optional("in_stock", 3, FieldType::Bool),
            Field::optional("weight", 4, FieldType::Float),
            Field::optional("price", 5, FieldType::Double),
            Field::optional("count", 6, FieldType::Int32),
            Field::optional("blob", 7, FieldType::Bytes),
        ],
    )
    .unwrap()
}

fn schema() -> DatabaseSchema {
    DatabaseSchema::new(
        "Store",
        vec![
            Field::table("items", 1, item()),
            Field::table("returns", 2, item()),
        ],
    )
    .unwrap()
}

fn arb_row() -> impl Strategy<Value = Row> {
    (
        proptest::option::of(any::<i64>()),
        proptest::option::of("[a-z][a-z ]{0,8}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of(-1.0e6f32..1.0e6f32),
        proptest::option::of(-1.0e12f64..1.0e12f64),
        proptest::option::of(any::<i32>()),
        proptest::option::of(proptest::collection::vec(any::<u8>(), 0..16)),
    )
        .prop_map(|(id, label, in_stock, weight, price, count, blob)| {
            let values: [(&str, Option<Value>); 7] = [
                ("id", id.map(Value::Int64)),
                ("label", label.map(Value::String)),
                ("in_stock", in_stock.map(Value::Bool)),
                ("weight", weight.map(Value::Float)),
                ("price", price.map(Value::Double)),
                ("count", count.map(Value::Int32)),
                ("blob", blob.map(Value::Bytes)),
            ];
            Row::from_named(
                &item(),
                values
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|value| (name, value))),
            )
            .unwrap()
        })
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        proptest::collection::vec(arb_row(), 0..8),
        proptest::collection::vec(arb_row(), 0..8),
    )
        .prop_map(|(items, returns)| {
            let mut snapshot = Snapshot::new();
            snapshot.extend_table("items", items);
            snapshot.extend_table("returns", returns);
            snapshot
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn insert_then_read_is_identity(snapshot in arb_snapshot()) {
        let mapper = SqMapper::new(SqLite::connect_in_memory().unwrap(), schema());
        mapper.drop_and_create_tables().unwrap();
        mapper.insert_snapshot(&snapshot).unwrap();
        prop_assert_eq!(mapper.snapshot_all().unwrap(), snapshot);
    }
}
