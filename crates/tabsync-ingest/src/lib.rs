//! CSV ingestion for tabsync.
//!
//! Reads the CSV entries of an archive into text rows described by a raw
//! (all-string) database schema, streams them as bounded batches, and converts
//! text rows into rows typed by the output schema.
//!
//! # Example
//!
//! ```ignore
//! use tabsync_ingest::{CsvFormat, ZipEntries, convert_snapshot, route};
//! use tabsync_model::{DEFAULT_BATCH_SIZE, Discard, IssueTally};
//!
//! let raw_schema = schema.to_text_schema();
//! let mut entries = ZipEntries::open(path)?;
//! let mut issues = IssueTally::new();
//! route(&mut entries, &raw_schema, &CsvFormat::excel(), DEFAULT_BATCH_SIZE, &mut issues, |batch| {
//!     let typed = convert_snapshot(&batch, &raw_schema, &schema, &mut Discard)?;
//!     store(typed)
//! })?;
//! ```

pub mod archive;
pub mod convert;
pub mod csv;
pub mod error;
pub mod router;

// === Error Types ===
pub use error::{ConvertError, IngestError, Result};

// === Archive Entries ===
pub use archive::{ArchiveEntry, EntrySource, MemoryEntries, ZipEntries, table_name_for_entry};

// === CSV Reading ===
pub use self::csv::{CsvFormat, CsvRecord, InconsistentRecord, RowReader, parse};

// === Routing and Conversion ===
pub use convert::{RowPositions, convert_batch, convert_row, convert_snapshot};
pub use router::{RouteSummary, TableSummary, read_snapshot, route};
