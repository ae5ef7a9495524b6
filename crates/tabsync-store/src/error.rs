//! Error types for SQLite storage.

use std::path::PathBuf;

use tabsync_model::{FieldType, ModelError};
use thiserror::Error;

/// Errors raised by the SQLite wrapper and the relational mapper.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    // === Schema Errors ===
    /// Field type with no column type mapping.
    #[error("{field_type} field {field} has no SQLite column type")]
    UnsupportedType { field: String, field_type: FieldType },

    #[error("failed to {action} table {table}: {source}")]
    Ddl {
        table: String,
        action: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database schema has no table {table}")]
    UnknownTable { table: String },

    // === Write Errors ===
    #[error("row for {table} sets field number {number}, which the table does not declare")]
    UnknownField { table: String, number: u32 },

    #[error("{table}.{field}: {actual} value in {expected} column")]
    TypeMismatch {
        table: String,
        field: String,
        expected: FieldType,
        actual: FieldType,
    },

    #[error("failed to bind {table}.{field}: {source}")]
    Bind {
        table: String,
        field: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to insert into {table}: {source}")]
    Insert {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    // === Read Errors ===
    #[error("failed to read table {table}: {source}")]
    Read {
        table: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("failed to decode column {field}: {source}")]
    Decode {
        field: String,
        #[source]
        source: rusqlite::types::FromSqlError,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("batch size must be greater than zero")]
    InvalidBatchSize,

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    pub(crate) fn read(table: &str, source: StoreError) -> Self {
        StoreError::Read {
            table: table.to_string(),
            source: Box::new(source),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = StoreError::read(
            "asset",
            StoreError::InvalidValue {
                field: "kind".to_string(),
                reason: "no enum value 9".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "failed to read table asset: invalid value for kind: no enum value 9"
        );
    }
}
