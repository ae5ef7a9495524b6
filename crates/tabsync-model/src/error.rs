//! Error types for schema construction and row population.

use thiserror::Error;

use crate::schema::{Cardinality, FieldType};

/// Errors raised while declaring schemas or populating rows.
///
/// Schema errors are configuration errors: they surface when a schema is
/// declared and are never expected at runtime once a schema is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Field or schema name is empty.
    #[error("schema {schema}: empty field name")]
    EmptyFieldName { schema: String },

    /// Field numbers start at 1.
    #[error("schema {schema}: field {field} has number 0")]
    ZeroFieldNumber { schema: String, field: String },

    /// Two fields share a name.
    #[error("schema {schema}: duplicate field name {field}")]
    DuplicateFieldName { schema: String, field: String },

    /// Two fields share a number.
    #[error("schema {schema}: duplicate field number {number}")]
    DuplicateFieldNumber { schema: String, number: u32 },

    /// Field breaks the cardinality/type pairing required by the schema kind.
    #[error("schema {schema}: field {field} is {cardinality} {field_type}, expected {expected}")]
    InvalidField {
        schema: String,
        field: String,
        cardinality: Cardinality,
        field_type: FieldType,
        expected: &'static str,
    },

    /// Enum field without an enum type.
    #[error("schema {schema}: enum field {field} has no enum type")]
    MissingEnumType { schema: String, field: String },

    /// Table field without a nested table schema.
    #[error("schema {schema}: table field {field} has no table schema")]
    MissingTableSchema { schema: String, field: String },

    /// Value tag differs from the declared field type.
    #[error("field {field}: expected {expected} value, got {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: FieldType,
    },

    /// Enum number not defined by the enum type.
    #[error("field {field}: enum {enum_name} has no value numbered {number}")]
    UnknownEnumNumber {
        field: String,
        enum_name: String,
        number: i32,
    },

    /// Enum column refers to an enum the declaration does not define.
    #[error("field {field}: enum type {enum_name} is not declared")]
    UndeclaredEnum { field: String, enum_name: String },

    /// Enum value name not defined by the enum type.
    #[error("enum {enum_name} has no value named {name}")]
    UnknownEnumName { enum_name: String, name: String },

    /// Field name not declared by the schema.
    #[error("schema {schema}: no field named {field}")]
    UnknownField { schema: String, field: String },
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
