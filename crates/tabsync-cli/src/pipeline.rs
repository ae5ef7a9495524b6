//! Archive import: route CSV entries, convert each batch, insert it.

use std::cell::RefCell;
use std::path::Path;

use tabsync_ingest::{EntrySource, RouteSummary, RowPositions, ZipEntries, convert_batch, route};
use tabsync_model::{Batch, DatabaseSchema, Issue, IssueKind, IssueTally, Receiver};
use tabsync_store::{SqLite, SqMapper};
use tracing::{info, warn};

use crate::config::ImportOptions;
use crate::error::PipelineError;

/// Counts of a completed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub route: RouteSummary,
    pub rows_inserted: usize,
}

/// Tallies issues and logs the first occurrence of each distinct one.
#[derive(Debug, Default)]
pub struct IssueLog {
    tally: IssueTally,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> &IssueTally {
        &self.tally
    }

    pub fn into_tally(self) -> IssueTally {
        self.tally
    }
}

impl Receiver<Issue> for IssueLog {
    fn receive(&mut self, issue: Issue) {
        let kind = issue.kind;
        let message = issue.to_string();
        if self.tally.record(issue) == 1 {
            match kind {
                IssueKind::BatchRecords => info!("{message}"),
                IssueKind::InconsistentRecord | IssueKind::InvalidFieldValue => {
                    warn!("{message}");
                }
            }
        }
    }
}

/// Imports a ZIP archive into the SQLite file at `database`.
pub fn import_into_database(
    archive: &Path,
    database: &Path,
    schema: DatabaseSchema,
    options: &ImportOptions,
    issues: &mut dyn Receiver<Issue>,
) -> Result<ImportSummary, PipelineError> {
    let mut entries = ZipEntries::open(archive)?;
    let mapper = SqMapper::new(SqLite::connect(database)?, schema);
    import_archive(&mut entries, &mapper, options, issues)
}

/// Replaces the mapper's tables with the contents of `entries`.
///
/// Runs in one transaction: tables are dropped and recreated, every batch is
/// converted to the typed schema and inserted, then the transaction commits.
/// Any error rolls the whole import back.
pub fn import_archive<S>(
    entries: &mut S,
    mapper: &SqMapper,
    options: &ImportOptions,
    issues: &mut dyn Receiver<Issue>,
) -> Result<ImportSummary, PipelineError>
where
    S: EntrySource + ?Sized,
{
    let db = mapper.db();
    db.begin()?;
    match load(entries, mapper, options, issues) {
        Ok(summary) => {
            db.commit()?;
            info!(
                tables = summary.route.tables.len(),
                rows = summary.rows_inserted,
                "import complete"
            );
            Ok(summary)
        }
        Err(err) => {
            if let Err(rollback) = db.rollback() {
                warn!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

fn load<S>(
    entries: &mut S,
    mapper: &SqMapper,
    options: &ImportOptions,
    issues: &mut dyn Receiver<Issue>,
) -> Result<ImportSummary, PipelineError>
where
    S: EntrySource + ?Sized,
{
    mapper.drop_and_create_tables()?;
    let raw_schema = mapper.schema().to_text_schema();
    // Routing and conversion both report into the same sink, one at a time.
    let issues = RefCell::new(issues);
    let mut positions = RowPositions::new();
    let mut rows_inserted = 0;

    let route = route(
        entries,
        &raw_schema,
        &options.csv_format,
        options.batch_size,
        &mut |issue: Issue| issues.borrow_mut().receive(issue),
        |batch: Batch| {
            let typed = convert_batch(
                &batch,
                &raw_schema,
                mapper.schema(),
                &mut positions,
                &mut |issue: Issue| issues.borrow_mut().receive(issue),
            )?;
            rows_inserted += mapper.insert_snapshot(&typed)?;
            Ok::<_, PipelineError>(())
        },
    )?;

    Ok(ImportSummary {
        route,
        rows_inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_log_counts_repeats() {
        let mut log = IssueLog::new();
        log.receive(Issue::invalid_field_value(2, "X").with_table_id(1));
        log.receive(Issue::invalid_field_value(2, "X").with_table_id(1));
        log.receive(Issue::batch_records(1, 2));
        let tally = log.into_tally();
        assert_eq!(tally.distinct(), 2);
        assert_eq!(tally.total(), 3);
    }
}
