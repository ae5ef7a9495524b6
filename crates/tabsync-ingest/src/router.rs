//! Routes archive entries to table schemas and streams their rows as batches.

use std::io::Read;

use tabsync_model::{
    Batch, DEFAULT_BATCH_SIZE, DatabaseSchema, Issue, Receiver, Row, Snapshot, TableSchema,
};
use tracing::{debug, info, warn};

use crate::archive::EntrySource;
use crate::csv::{CsvFormat, CsvRecord, RowReader};
use crate::error::{IngestError, Result};

/// Counts for one routed archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub table: String,
    pub table_id: u32,
    /// Consistent records delivered in batches.
    pub records: usize,
    /// Records dropped because their field count did not match the header.
    pub inconsistent: usize,
    pub batches: usize,
}

/// Outcome of a [`route`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSummary {
    /// Routed entries in archive order.
    pub tables: Vec<TableSummary>,
    /// Entries whose name matched no table.
    pub skipped: Vec<String>,
}

impl RouteSummary {
    pub fn records(&self) -> usize {
        self.tables.iter().map(|table| table.records).sum()
    }

    pub fn inconsistent(&self) -> usize {
        self.tables.iter().map(|table| table.inconsistent).sum()
    }

    pub fn batches(&self) -> usize {
        self.tables.iter().map(|table| table.batches).sum()
    }

    pub fn table(&self, name: &str) -> Option<&TableSummary> {
        self.tables.iter().find(|table| table.table == name)
    }
}

/// Streams every entry of `entries` whose name matches a table of `schema`.
///
/// `schema` must be the all-text raw schema. Each table's consistent rows are
/// handed to `on_batch` in fragments of exactly `batch_size` rows, followed by
/// one partial fragment if rows remain. Inconsistent records are reported as
/// `INCONSISTENT_RECORD` issues, and after a table's last batch one
/// `BATCH_RECORDS` issue carries its total. An error from `on_batch` stops
/// routing and is returned unchanged.
pub fn route<S, F, E>(
    entries: &mut S,
    schema: &DatabaseSchema,
    format: &CsvFormat,
    batch_size: usize,
    issues: &mut dyn Receiver<Issue>,
    mut on_batch: F,
) -> std::result::Result<RouteSummary, E>
where
    S: EntrySource + ?Sized,
    F: FnMut(Batch) -> std::result::Result<(), E>,
    E: From<IngestError>,
{
    if batch_size == 0 {
        return Err(IngestError::InvalidBatchSize.into());
    }

    let mut summary = RouteSummary::default();
    while let Some(entry) = entries.next_entry()? {
        let Some((field, table)) = schema.table(entry.table_name()) else {
            debug!(entry = entry.name(), "skipping archive entry without a matching table");
            summary.skipped.push(entry.name().to_string());
            continue;
        };
        debug!(entry = entry.name(), table = field.name(), "routing archive entry");

        let mut router = TableRouter::new(field.name(), field.number(), batch_size);
        for record in RowReader::new(table, entry.into_reader(), format)? {
            match record? {
                CsvRecord::Row(row) => {
                    if let Some(batch) = router.push(row) {
                        on_batch(batch)?;
                    }
                }
                CsvRecord::Inconsistent(bad) => {
                    warn!(
                        table = field.name(),
                        record_index = bad.record_index,
                        field_count = bad.field_count,
                        "inconsistent record"
                    );
                    router.summary.inconsistent += 1;
                    issues.receive(Issue::inconsistent_record(
                        field.number(),
                        bad.record_index,
                        bad.field_count,
                    ));
                }
            }
        }
        if let Some(batch) = router.finish() {
            on_batch(batch)?;
        }
        issues.receive(Issue::batch_records(field.number(), router.summary.records));
        info!(
            table = field.name(),
            records = router.summary.records,
            inconsistent = router.summary.inconsistent,
            batches = router.summary.batches,
            "routed table"
        );
        summary.tables.push(router.summary);
    }
    Ok(summary)
}

/// Reads every matching entry into one snapshot.
///
/// Unlike [`route`], an inconsistent record fails the whole read.
pub fn read_snapshot<S>(
    entries: &mut S,
    schema: &DatabaseSchema,
    format: &CsvFormat,
) -> Result<Snapshot>
where
    S: EntrySource + ?Sized,
{
    let mut snapshot = Snapshot::new();
    while let Some(entry) = entries.next_entry()? {
        let Some((field, table)) = schema.table(entry.table_name()) else {
            debug!(entry = entry.name(), "skipping archive entry without a matching table");
            continue;
        };
        let rows = read_table(field.name(), table, entry.into_reader(), format)?;
        snapshot.extend_table(field.name(), rows);
    }
    Ok(snapshot)
}

fn read_table(
    name: &str,
    table: &TableSchema,
    reader: Box<dyn Read + '_>,
    format: &CsvFormat,
) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for record in RowReader::new(table, reader, format)? {
        match record? {
            CsvRecord::Row(row) => rows.push(row),
            CsvRecord::Inconsistent(bad) => {
                return Err(IngestError::InconsistentRecord {
                    table: name.to_string(),
                    record_index: bad.record_index,
                    field_count: bad.field_count,
                });
            }
        }
    }
    Ok(rows)
}

/// Accumulates one table's rows and cuts them into batches.
struct TableRouter {
    rows: Vec<Row>,
    batch_size: usize,
    summary: TableSummary,
}

impl TableRouter {
    fn new(table: &str, table_id: u32, batch_size: usize) -> Self {
        Self {
            rows: Vec::with_capacity(batch_size.min(DEFAULT_BATCH_SIZE)),
            batch_size,
            summary: TableSummary {
                table: table.to_string(),
                table_id,
                records: 0,
                inconsistent: 0,
                batches: 0,
            },
        }
    }

    fn push(&mut self, row: Row) -> Option<Batch> {
        self.rows.push(row);
        self.summary.records += 1;
        if self.summary.records % self.batch_size == 0 {
            return self.flush();
        }
        None
    }

    fn finish(&mut self) -> Option<Batch> {
        if self.rows.is_empty() {
            return None;
        }
        self.flush()
    }

    fn flush(&mut self) -> Option<Batch> {
        let rows = std::mem::replace(
            &mut self.rows,
            Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE)),
        );
        self.summary.batches += 1;
        debug!(
            table = self.summary.table.as_str(),
            rows = rows.len(),
            batch = self.summary.batches,
            "emitting batch"
        );
        let mut batch = Batch::new();
        batch.extend_table(&self.summary.table, rows);
        Some(batch)
    }
}
