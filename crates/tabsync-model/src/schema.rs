//! Declarative schema model.
//!
//! A [`DatabaseSchema`] is an ordered set of table fields, each pointing to a
//! [`TableSchema`]; a table schema is an ordered set of optional primitive
//! columns. Field order is the canonical order for DDL and positional binding,
//! and field numbers align fields across schemas (raw text vs typed).

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Bool,
    Int32,
    Int64,
    Float,
    Double,
    Bytes,
    Enum,
    Table,
}

impl FieldType {
    /// Returns the lowercase name used in declarations and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "bool",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Bytes => "bytes",
            FieldType::Enum => "enum",
            FieldType::Table => "table",
        }
    }

    /// Returns true for every type a table column may have.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, FieldType::Table)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    Optional,
    Repeated,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Optional => f.write_str("optional"),
            Cardinality::Repeated => f.write_str("repeated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// A named set of enum values, stored by number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumType {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|(name, number)| EnumValue {
                    name: name.into(),
                    number,
                })
                .collect(),
        }
    }

    pub fn find_by_number(&self, number: i32) -> Option<&EnumValue> {
        self.values.iter().find(|value| value.number == number)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|value| value.name == name)
    }

    /// Resolves a value name to its number.
    pub fn number_of(&self, name: &str) -> Result<i32> {
        self.find_by_name(name)
            .map(|value| value.number)
            .ok_or_else(|| ModelError::UnknownEnumName {
                enum_name: self.name.clone(),
                name: name.to_string(),
            })
    }
}

/// One named, numbered, typed slot of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    number: u32,
    field_type: FieldType,
    cardinality: Cardinality,
    enum_type: Option<Arc<EnumType>>,
    table: Option<Arc<TableSchema>>,
}

impl Field {
    /// Creates a field without attached enum or table metadata.
    ///
    /// Whether the combination is legal is decided when the field is placed
    /// into a [`TableSchema`] or [`DatabaseSchema`].
    pub fn new(
        name: impl Into<String>,
        number: u32,
        field_type: FieldType,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            number,
            field_type,
            cardinality,
            enum_type: None,
            table: None,
        }
    }

    /// Optional primitive column.
    pub fn optional(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        Self::new(name, number, field_type, Cardinality::Optional)
    }

    /// Optional enum column backed by `enum_type`.
    pub fn enumeration(name: impl Into<String>, number: u32, enum_type: Arc<EnumType>) -> Self {
        Self {
            enum_type: Some(enum_type),
            ..Self::optional(name, number, FieldType::Enum)
        }
    }

    /// Repeated table slot of a database schema.
    pub fn table(name: impl Into<String>, number: u32, table: TableSchema) -> Self {
        Self {
            table: Some(Arc::new(table)),
            ..Self::new(name, number, FieldType::Table, Cardinality::Repeated)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn enum_type(&self) -> Option<&EnumType> {
        self.enum_type.as_deref()
    }

    pub fn table_schema(&self) -> Option<&TableSchema> {
        self.table.as_deref()
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

/// Ordered set of fields with unique names and numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    by_name: HashMap<String, usize>,
    by_number: HashMap<u32, usize>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        let mut by_name = HashMap::with_capacity(fields.len());
        let mut by_number = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(ModelError::EmptyFieldName { schema: name });
            }
            if field.number == 0 {
                return Err(ModelError::ZeroFieldNumber {
                    schema: name,
                    field: field.name.clone(),
                });
            }
            if by_name.insert(field.name.clone(), idx).is_some() {
                return Err(ModelError::DuplicateFieldName {
                    schema: name,
                    field: field.name.clone(),
                });
            }
            if by_number.insert(field.number, idx).is_some() {
                return Err(ModelError::DuplicateFieldNumber {
                    schema: name,
                    number: field.number,
                });
            }
        }
        Ok(Self {
            name,
            fields,
            by_name,
            by_number,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.by_name.get(name).map(|&idx| &self.fields[idx])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&Field> {
        self.by_number.get(&number).map(|&idx| &self.fields[idx])
    }

    /// Like [`Schema::field_by_name`], but missing names are an error.
    pub fn require_field(&self, name: &str) -> Result<&Field> {
        self.field_by_name(name)
            .ok_or_else(|| ModelError::UnknownField {
                schema: self.name.clone(),
                field: name.to_string(),
            })
    }
}

/// Schema of one table: optional primitive columns only.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema(Schema);

impl TableSchema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let schema = Schema::new(name, fields)?;
        for field in schema.fields() {
            if field.cardinality != Cardinality::Optional || !field.field_type.is_primitive() {
                return Err(ModelError::InvalidField {
                    schema: schema.name.clone(),
                    field: field.name.clone(),
                    cardinality: field.cardinality,
                    field_type: field.field_type,
                    expected: "optional primitive",
                });
            }
            if field.field_type == FieldType::Enum && field.enum_type.is_none() {
                return Err(ModelError::MissingEnumType {
                    schema: schema.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self(schema))
    }

    /// Same column names and numbers, every column typed as text.
    pub fn to_text_schema(&self) -> TableSchema {
        let fields = self
            .fields()
            .iter()
            .map(|field| Field::optional(field.name.clone(), field.number, FieldType::String))
            .collect();
        // Names and numbers were validated when `self` was built.
        TableSchema(Schema {
            fields,
            ..self.0.clone()
        })
    }

    pub fn is_text(&self) -> bool {
        self.fields()
            .iter()
            .all(|field| field.field_type == FieldType::String)
    }
}

impl Deref for TableSchema {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.0
    }
}

/// Schema of a database: one repeated table field per table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSchema(Schema);

impl DatabaseSchema {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let schema = Schema::new(name, fields)?;
        for field in schema.fields() {
            if field.cardinality != Cardinality::Repeated || field.field_type != FieldType::Table {
                return Err(ModelError::InvalidField {
                    schema: schema.name.clone(),
                    field: field.name.clone(),
                    cardinality: field.cardinality,
                    field_type: field.field_type,
                    expected: "repeated table",
                });
            }
            if field.table.is_none() {
                return Err(ModelError::MissingTableSchema {
                    schema: schema.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self(schema))
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = (&Field, &TableSchema)> {
        self.fields()
            .iter()
            .filter_map(|field| field.table_schema().map(|table| (field, table)))
    }

    pub fn table(&self, name: &str) -> Option<(&Field, &TableSchema)> {
        let field = self.field_by_name(name)?;
        field.table_schema().map(|table| (field, table))
    }

    pub fn table_by_number(&self, number: u32) -> Option<(&Field, &TableSchema)> {
        let field = self.field_by_number(number)?;
        field.table_schema().map(|table| (field, table))
    }

    pub fn table_at(&self, index: usize) -> Option<(&Field, &TableSchema)> {
        let field = self.fields().get(index)?;
        field.table_schema().map(|table| (field, table))
    }

    /// Raw schema for CSV ingestion: same tables, all columns text.
    pub fn to_text_schema(&self) -> DatabaseSchema {
        let fields = self
            .tables()
            .map(|(field, table)| {
                Field::table(field.name.clone(), field.number, table.to_text_schema())
            })
            .collect();
        DatabaseSchema(Schema {
            fields,
            ..self.0.clone()
        })
    }
}

impl Deref for DatabaseSchema {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.0
    }
}
