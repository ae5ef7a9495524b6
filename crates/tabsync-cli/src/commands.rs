use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use tracing::info;

use tabsync_cli::config::{ImportOptions, load_schema};
use tabsync_cli::export::export_json_lines;
use tabsync_cli::pipeline::{ImportSummary, IssueLog, import_into_database};
use tabsync_ingest::CsvFormat;
use tabsync_store::{SqLite, SqMapper};

use crate::cli::{ExportArgs, ImportArgs, InspectArgs};

pub fn run_import(args: &ImportArgs, issues: &mut IssueLog) -> Result<ImportSummary> {
    let schema = load_schema(&args.schema).context("load schema")?;
    let options = ImportOptions::default()
        .with_batch_size(args.batch_size)
        .with_csv_format(CsvFormat::excel().with_delimiter(args.delimiter));
    info!(
        archive = %args.archive.display(),
        database = %args.database.display(),
        batch_size = options.batch_size,
        "starting import"
    );
    let summary = import_into_database(&args.archive, &args.database, schema, &options, issues)
        .with_context(|| format!("import {}", args.archive.display()))?;
    Ok(summary)
}

pub fn run_export(args: &ExportArgs) -> Result<usize> {
    let schema = load_schema(&args.schema).context("load schema")?;
    let db = SqLite::connect(&args.database)
        .with_context(|| format!("open {}", args.database.display()))?;
    let mapper = SqMapper::new(db, schema);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let rows = export_json_lines(&mapper, args.batch_size, args.row_batches, &mut out)
        .with_context(|| format!("export {}", args.database.display()))?;
    Ok(rows)
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let db = SqLite::connect(&args.database)
        .with_context(|| format!("open {}", args.database.display()))?;
    let catalog = db.schema().context("read catalog")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&catalog).context("encode catalog")?
    );
    Ok(())
}
