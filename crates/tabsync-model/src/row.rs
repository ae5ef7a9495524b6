//! Typed rows and multi-table snapshots.

use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use crate::schema::{Field, FieldType, Schema};
use crate::value::Value;

/// Rows per batch used when the caller does not choose one.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// One record: field number to value, holding only fields that are set.
///
/// An absent field is NULL, never the zero value of its type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<u32, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column name, value)` pairs checked against `schema`.
    pub fn from_named<'a, I>(schema: &Schema, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut row = Row::new();
        for (name, value) in values {
            row.set(schema.require_field(name)?, value)?;
        }
        Ok(row)
    }

    /// Sets `field`, rejecting values whose tag does not match the field type.
    pub fn set(&mut self, field: &Field, value: Value) -> Result<()> {
        if value.field_type() != field.field_type() {
            return Err(ModelError::TypeMismatch {
                field: field.name().to_string(),
                expected: field.field_type(),
                actual: value.field_type(),
            });
        }
        if let (Value::Enum(number), Some(enum_type)) = (&value, field.enum_type())
            && enum_type.find_by_number(*number).is_none()
        {
            return Err(ModelError::UnknownEnumNumber {
                field: field.name().to_string(),
                enum_name: enum_type.name.clone(),
                number: *number,
            });
        }
        self.values.insert(field.number(), value);
        Ok(())
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, field: &Field, value: impl Into<Value>) -> Result<Self> {
        self.set(field, value.into())?;
        Ok(self)
    }

    pub fn get(&self, field: &Field) -> Option<&Value> {
        self.values.get(&field.number())
    }

    pub fn get_by_number(&self, number: u32) -> Option<&Value> {
        self.values.get(&number)
    }

    pub fn has(&self, field: &Field) -> bool {
        self.values.contains_key(&field.number())
    }

    pub fn clear(&mut self, field: &Field) -> Option<Value> {
        self.values.remove(&field.number())
    }

    /// Set fields in field-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.values.iter().map(|(&number, value)| (number, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Text value of a set string field.
    pub fn text(&self, field: &Field) -> Option<&str> {
        debug_assert_eq!(field.field_type(), FieldType::String);
        self.get(field).and_then(Value::as_str)
    }
}

/// Table name to ordered rows, for every table of one database schema.
///
/// Tables without rows are never stored, so an empty table and a missing
/// table compare equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    tables: BTreeMap<String, Vec<Row>>,
}

/// Bounded fragment of a snapshot used as the streaming unit.
pub type Batch = Snapshot;

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: &str, row: Row) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn extend_table(&mut self, table: &str, rows: impl IntoIterator<Item = Row>) {
        let mut rows = rows.into_iter().peekable();
        if rows.peek().is_none() {
            return;
        }
        self.tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Appends every table of `other` after the rows already held.
    pub fn merge(&mut self, other: Snapshot) {
        for (table, rows) in other.tables {
            self.extend_table(&table, rows);
        }
    }

    pub fn rows(&self, table: &str) -> &[Row] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    /// Non-empty tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Replaces the rows of `table`, dropping it when `rows` is empty.
    pub fn set_rows(&mut self, table: &str, rows: Vec<Row>) {
        if rows.is_empty() {
            self.tables.remove(table);
        } else {
            self.tables.insert(table.to_string(), rows);
        }
    }
}
