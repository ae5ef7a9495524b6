//! Text-to-typed row conversion.
//!
//! Output fields are located by field number, so the raw text schema and the
//! typed schema may order their columns differently. Bad boolean literals are
//! reported as issues and leave the field absent; bad numeric literals fail
//! the conversion.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use tabsync_model::{
    Batch, DatabaseSchema, Field, FieldType, Issue, Receiver, Row, Snapshot, TableSchema, Value,
};

use crate::error::ConvertError;

/// Converts one all-text row into a row typed by `output`.
///
/// Issues are emitted without a table id; callers that know the table attach
/// it (see [`convert_snapshot`]).
pub fn convert_row(
    raw: &Row,
    output: &TableSchema,
    issues: &mut dyn Receiver<Issue>,
) -> Result<Row, ConvertError> {
    let mut row = Row::new();
    for (number, value) in raw.iter() {
        let field = output
            .field_by_number(number)
            .ok_or_else(|| ConvertError::UnknownField {
                schema: output.name().to_string(),
                number,
            })?;
        let Value::String(text) = value else {
            return Err(ConvertError::NonTextValue {
                field: field.name().to_string(),
                actual: value.field_type(),
            });
        };
        if let Some(typed) = convert_value(field, text, issues)? {
            row.set(field, typed)?;
        }
    }
    Ok(row)
}

fn convert_value(
    field: &Field,
    text: &str,
    issues: &mut dyn Receiver<Issue>,
) -> Result<Option<Value>, ConvertError> {
    let value = match field.field_type() {
        FieldType::String => Value::from(text),
        FieldType::Bool => match text {
            "Y" => Value::Bool(true),
            "N" => Value::Bool(false),
            _ => {
                issues.receive(Issue::invalid_field_value(field.number(), text));
                return Ok(None);
            }
        },
        FieldType::Int32 => Value::Int32(parse_number(field, text)?),
        FieldType::Int64 => Value::Int64(parse_number(field, text)?),
        FieldType::Float => Value::Float(parse_number(field, text)?),
        FieldType::Double => Value::Double(parse_number(field, text)?),
        FieldType::Bytes | FieldType::Enum | FieldType::Table => {
            return Err(ConvertError::UnsupportedType {
                field: field.name().to_string(),
                field_type: field.field_type(),
            });
        }
    };
    Ok(Some(value))
}

fn parse_number<T>(field: &Field, text: &str) -> Result<T, ConvertError>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse().map_err(|err: T::Err| ConvertError::InvalidNumber {
        field: field.name().to_string(),
        field_type: field.field_type(),
        value: text.to_string(),
        reason: err.to_string(),
    })
}

/// Rows already converted per table, carried across the batches of one
/// import so row failures report their position within the whole table.
#[derive(Debug, Clone, Default)]
pub struct RowPositions {
    converted: HashMap<String, usize>,
}

impl RowPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of `table` converted so far.
    pub fn converted(&self, table: &str) -> usize {
        self.converted.get(table).copied().unwrap_or_default()
    }
}

/// Converts every table of a raw snapshot.
///
/// Raw tables are matched to output tables by table field number. Every issue
/// is tagged with the output table id, and row failures carry the table name
/// and the 1-based row position within `raw`.
pub fn convert_snapshot(
    raw: &Snapshot,
    raw_schema: &DatabaseSchema,
    output_schema: &DatabaseSchema,
    issues: &mut dyn Receiver<Issue>,
) -> Result<Snapshot, ConvertError> {
    convert_batch(raw, raw_schema, output_schema, &mut RowPositions::new(), issues)
}

/// Converts one batch of a streamed table sequence.
///
/// Like [`convert_snapshot`], but row positions continue from `positions`,
/// which is advanced by the rows of `raw` on success. Positions count the
/// rows delivered for a table, so records dropped as inconsistent are not
/// counted.
pub fn convert_batch(
    raw: &Batch,
    raw_schema: &DatabaseSchema,
    output_schema: &DatabaseSchema,
    positions: &mut RowPositions,
    issues: &mut dyn Receiver<Issue>,
) -> Result<Snapshot, ConvertError> {
    let mut converted = Snapshot::new();
    for (table, rows) in raw.tables() {
        let (raw_field, _) = raw_schema
            .table(table)
            .ok_or_else(|| ConvertError::UnknownTable {
                schema: raw_schema.name().to_string(),
                table: table.to_string(),
            })?;
        let (field, output) = output_schema
            .table_by_number(raw_field.number())
            .ok_or_else(|| ConvertError::UnknownTable {
                schema: output_schema.name().to_string(),
                table: table.to_string(),
            })?;

        let table_id = field.number();
        let offset = positions.converted(table);
        let mut typed = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let mut tagged = |issue: Issue| issues.receive(issue.with_table_id(table_id));
            let row = convert_row(row, output, &mut tagged).map_err(|source| {
                ConvertError::Record {
                    table: field.name().to_string(),
                    record_index: offset + idx + 1,
                    source: Box::new(source),
                }
            })?;
            typed.push(row);
        }
        *positions.converted.entry(table.to_string()).or_default() += rows.len();
        converted.extend_table(field.name(), typed);
    }
    Ok(converted)
}
