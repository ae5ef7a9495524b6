//! Schema model for tabsync.
//!
//! Declares databases as ordered sets of tables and tables as ordered sets of
//! typed columns, and defines the values exchanged between the CSV ingestor,
//! the converter and the SQLite mapper: [`Row`], [`Snapshot`] and [`Issue`].

pub mod decl;
pub mod error;
pub mod issue;
pub mod receiver;
pub mod row;
pub mod schema;
pub mod value;

pub use decl::{ColumnDecl, SchemaDecl, TableDecl};
pub use error::{ModelError, Result};
pub use issue::{Issue, IssueKind, IssueTally};
pub use receiver::{Discard, Receiver};
pub use row::{Batch, DEFAULT_BATCH_SIZE, Row, Snapshot};
pub use schema::{
    Cardinality, DatabaseSchema, EnumType, EnumValue, Field, FieldType, Schema, TableSchema,
};
pub use value::Value;
