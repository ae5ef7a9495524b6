//! JSON Lines export of a mapped database.

use std::io::Write;

use serde_json::{Map, Number, json};
use tabsync_model::{Batch, Row, TableSchema, Value};
use tabsync_store::SqMapper;
use tracing::debug;

use crate::error::PipelineError;

/// Converts one row to a JSON object keyed by column name.
///
/// Absent fields are left out. Bytes are hex encoded and enum values are
/// written by name when the number is declared.
pub fn row_to_json(table: &TableSchema, row: &Row) -> serde_json::Value {
    let mut object = Map::new();
    for field in table.fields() {
        let Some(value) = row.get(field) else {
            continue;
        };
        let json = match value {
            Value::String(text) => serde_json::Value::String(text.clone()),
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Int32(number) => json!(number),
            Value::Int64(number) => json!(number),
            Value::Float(number) => float(f64::from(*number)),
            Value::Double(number) => float(*number),
            Value::Bytes(bytes) => serde_json::Value::String(hex::encode(bytes)),
            Value::Enum(number) => match field
                .enum_type()
                .and_then(|enum_type| enum_type.find_by_number(*number))
            {
                Some(enum_value) => serde_json::Value::String(enum_value.name.clone()),
                None => json!(number),
            },
        };
        object.insert(field.name().to_string(), json);
    }
    serde_json::Value::Object(object)
}

// NaN and infinities have no JSON form.
fn float(value: f64) -> serde_json::Value {
    Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Writes every row of the database as `{"table": .., "row": {..}}` lines.
///
/// With `row_batches` the database is read in batches of `batch_size` rows,
/// otherwise in batches of `batch_size` whole tables. Within a batch tables
/// are written in schema order. Returns the number of rows written.
pub fn export_json_lines(
    mapper: &SqMapper,
    batch_size: usize,
    row_batches: bool,
    out: &mut impl Write,
) -> Result<usize, PipelineError> {
    let mut written = 0;
    if row_batches {
        for batch in mapper.snapshot_rows(batch_size)? {
            written += write_batch(mapper, &batch?, out)?;
        }
    } else {
        for batch in mapper.snapshot(batch_size)? {
            written += write_batch(mapper, &batch?, out)?;
        }
    }
    out.flush()?;
    debug!(rows = written, "exported rows");
    Ok(written)
}

fn write_batch(
    mapper: &SqMapper,
    batch: &Batch,
    out: &mut impl Write,
) -> Result<usize, PipelineError> {
    let mut written = 0;
    for (field, table) in mapper.schema().tables() {
        for row in batch.rows(field.name()) {
            let line = json!({
                "table": field.name(),
                "row": row_to_json(table, row),
            });
            serde_json::to_writer(&mut *out, &line)?;
            out.write_all(b"\n")?;
            written += 1;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabsync_model::{EnumType, Field, FieldType};

    use super::*;

    #[test]
    fn test_row_to_json_formats_values() {
        let kind = Arc::new(EnumType::new("Kind", [("APPLE", 1), ("ORANGE", 2)]));
        let table = TableSchema::new(
            "Produce",
            vec![
                Field::optional("name", 1, FieldType::String),
                Field::enumeration("kind", 2, kind),
                Field::optional("digest", 3, FieldType::Bytes),
                Field::optional("weight", 4, FieldType::Double),
                Field::optional("is_organic", 5, FieldType::Bool),
            ],
        )
        .unwrap();
        let row = Row::from_named(
            &table,
            [
                ("name", Value::from("Fuji")),
                ("kind", Value::Enum(1)),
                ("digest", Value::Bytes(vec![0xca, 0xfe])),
                ("weight", Value::Double(f64::NAN)),
            ],
        )
        .unwrap();

        assert_eq!(
            row_to_json(&table, &row),
            json!({"name": "Fuji", "kind": "APPLE", "digest": "cafe", "weight": null})
        );
    }
}
