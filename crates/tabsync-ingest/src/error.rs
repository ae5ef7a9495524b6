//! Error types for CSV ingestion and conversion.

use std::path::PathBuf;

use tabsync_model::{FieldType, ModelError};
use thiserror::Error;

/// Errors raised while reading archives and CSV entries.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Archive Errors ===
    /// Archive file could not be opened.
    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Archive container is malformed or an entry cannot be decoded.
    #[error("failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    // === CSV Errors ===
    /// CSV dialect setting that the reader cannot express.
    #[error("invalid CSV {setting} {value:?}: only ASCII characters are supported")]
    InvalidFormat { setting: &'static str, value: char },

    /// Raw table schemas must declare every column as text.
    #[error("column {field} of {table} must be string, found {field_type}")]
    NonTextColumn {
        table: String,
        field: String,
        field_type: FieldType,
    },

    /// The same column name appears twice in a header.
    #[error("duplicate header {name:?} in {table}")]
    DuplicateHeader { table: String, name: String },

    /// Malformed CSV input (I/O error, invalid UTF-8, unterminated quote).
    #[error("failed to read CSV for {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    /// Record whose field count differs from the header, when the caller
    /// requires a fully consistent input.
    #[error("table:{table} record:{record_index} fields:{field_count}")]
    InconsistentRecord {
        table: String,
        record_index: u64,
        field_count: usize,
    },

    // === Routing Errors ===
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors raised while converting text rows into typed rows.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Raw field number with no counterpart in the output schema.
    #[error("{schema} has no field number {number}")]
    UnknownField { schema: String, number: u32 },

    /// Raw snapshot table the schemas do not declare.
    #[error("{schema} has no table {table}")]
    UnknownTable { schema: String, table: String },

    /// Raw rows must only hold text values.
    #[error("field {field} holds a {actual} value, expected string")]
    NonTextValue { field: String, actual: FieldType },

    /// Numeric literal that does not parse as the declared type.
    #[error("field {field}: invalid {field_type} literal {value:?}: {reason}")]
    InvalidNumber {
        field: String,
        field_type: FieldType,
        value: String,
        reason: String,
    },

    /// Declared type the converter has no text coercion for.
    #[error("field {field}: cannot convert text to {field_type}")]
    UnsupportedType { field: String, field_type: FieldType },

    /// Row level failure with the table and the 1-based position of the row
    /// among the rows converted for that table.
    #[error("table {table} row {record_index}: {source}")]
    Record {
        table: String,
        record_index: usize,
        #[source]
        source: Box<ConvertError>,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
