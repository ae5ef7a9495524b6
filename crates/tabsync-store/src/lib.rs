//! SQLite storage for tabsync.
//!
//! [`SqMapper`] derives DDL, inserts and reads from a [`DatabaseSchema`]:
//! each table field becomes a table and each column field a column, in field
//! order. [`SqLite`] wraps the connection and reports the catalog as
//! [`SqSchema`].
//!
//! [`DatabaseSchema`]: tabsync_model::DatabaseSchema

pub mod catalog;
mod codec;
pub mod error;
pub mod mapper;
pub mod sqlite;

pub use catalog::{SqColumn, SqDatabase, SqIndex, SqObject, SqSchema, SqTable};
pub use error::{Result, StoreError};
pub use mapper::{RowBatches, SqMapper, TableBatches, create_table_sql, sq_type};
pub use sqlite::{SqLite, quote_identifier};
