//! Value binding and decoding between typed rows and SQLite.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use tabsync_model::{Field, FieldType, Row, TableSchema, Value};

use crate::error::{Result, StoreError};

/// Binds an optional row value; absent fields bind NULL.
pub(crate) struct BoundValue<'a>(pub Option<&'a Value>);

impl ToSql for BoundValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self.0 {
            None => ToSqlOutput::Owned(SqlValue::Null),
            Some(Value::String(text)) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Some(Value::Bool(flag)) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*flag))),
            Some(Value::Int32(number) | Value::Enum(number)) => {
                ToSqlOutput::Owned(SqlValue::Integer(i64::from(*number)))
            }
            Some(Value::Int64(number)) => ToSqlOutput::Owned(SqlValue::Integer(*number)),
            Some(Value::Float(number)) => ToSqlOutput::Owned(SqlValue::Real(f64::from(*number))),
            Some(Value::Double(number)) => ToSqlOutput::Owned(SqlValue::Real(*number)),
            Some(Value::Bytes(bytes)) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        };
        Ok(output)
    }
}

/// Result column position of every schema field present in a result set.
pub(crate) struct ColumnMap<'s> {
    columns: Vec<(usize, &'s Field)>,
}

impl<'s> ColumnMap<'s> {
    /// Maps `(position, column name)` pairs onto `schema` ignoring ASCII case.
    /// The first column with a matching name wins.
    pub(crate) fn new<'n>(
        schema: &'s TableSchema,
        names: impl IntoIterator<Item = (usize, &'n str)>,
    ) -> Self {
        let names: Vec<(usize, &str)> = names.into_iter().collect();
        let columns = schema
            .fields()
            .iter()
            .filter_map(|field| {
                names
                    .iter()
                    .find(|(_, name)| name.eq_ignore_ascii_case(field.name()))
                    .map(|&(position, _)| (position, field))
            })
            .collect();
        Self { columns }
    }

    pub(crate) fn decode(&self, row: &rusqlite::Row<'_>) -> Result<Row> {
        let mut decoded = Row::new();
        for &(position, field) in &self.columns {
            if let Some(value) = decode_value(field, row.get_ref(position)?)? {
                decoded.set(field, value)?;
            }
        }
        Ok(decoded)
    }
}

/// Reads one column value by the field's declared type; NULL is absent.
pub(crate) fn decode_value(field: &Field, value: ValueRef<'_>) -> Result<Option<Value>> {
    if matches!(value, ValueRef::Null) {
        return Ok(None);
    }
    let decoded = match field.field_type() {
        FieldType::Bytes => Value::Bytes(value.as_bytes().map_err(decode_error(field))?.to_vec()),
        FieldType::Enum => {
            let number = narrow_i32(field, value.as_i64().map_err(decode_error(field))?)?;
            if let Some(enum_type) = field.enum_type()
                && enum_type.find_by_number(number).is_none()
            {
                return Err(StoreError::InvalidValue {
                    field: field.name().to_string(),
                    reason: format!("{} has no value numbered {number}", enum_type.name),
                });
            }
            Value::Enum(number)
        }
        FieldType::String => Value::String(text(field, value)?),
        FieldType::Int64 => Value::Int64(value.as_i64().map_err(decode_error(field))?),
        FieldType::Bool => Value::Bool(value.as_i64().map_err(decode_error(field))? != 0),
        FieldType::Float => Value::Float(real(field, value)? as f32),
        FieldType::Int32 => {
            Value::Int32(narrow_i32(field, value.as_i64().map_err(decode_error(field))?)?)
        }
        FieldType::Double => Value::Double(real(field, value)?),
        FieldType::Table => {
            return Err(StoreError::UnsupportedType {
                field: field.name().to_string(),
                field_type: field.field_type(),
            });
        }
    };
    Ok(Some(decoded))
}

fn decode_error(field: &Field) -> impl FnOnce(rusqlite::types::FromSqlError) -> StoreError + '_ {
    move |source| StoreError::Decode {
        field: field.name().to_string(),
        source,
    }
}

/// Text of a string column; `string` columns have NUMERIC affinity, so
/// numeric looking text may come back as an integer or real.
fn text(field: &Field, value: ValueRef<'_>) -> Result<String> {
    match value {
        ValueRef::Integer(number) => Ok(number.to_string()),
        ValueRef::Real(number) => Ok(number.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8(bytes.to_vec())
            .map_err(|err| StoreError::InvalidValue {
                field: field.name().to_string(),
                reason: err.to_string(),
            }),
        ValueRef::Null => Ok(String::new()),
    }
}

fn real(field: &Field, value: ValueRef<'_>) -> Result<f64> {
    match value {
        ValueRef::Integer(number) => Ok(number as f64),
        _ => value.as_f64().map_err(decode_error(field)),
    }
}

fn narrow_i32(field: &Field, number: i64) -> Result<i32> {
    i32::try_from(number).map_err(|_| StoreError::InvalidValue {
        field: field.name().to_string(),
        reason: format!("{number} does not fit in int32"),
    })
}
