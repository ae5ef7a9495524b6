//! CLI argument definitions for tabsync.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tabsync_model::DEFAULT_BATCH_SIZE;

#[derive(Parser)]
#[command(
    name = "tabsync",
    version,
    about = "Load CSV archives into SQLite through a declared schema",
    long_about = "Load the CSV entries of a ZIP archive into SQLite tables.\n\n\
                  Tables and column types come from a JSON schema declaration.\n\
                  Inconsistent records and bad values are reported, not fatal."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replace the database tables with the contents of a CSV archive.
    Import(ImportArgs),

    /// Stream every table of a database as JSON lines.
    Export(ExportArgs),

    /// Print the SQLite catalog of a database as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// ZIP archive with one CSV entry per table.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// SQLite database file, created if missing.
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// JSON schema declaration describing the tables.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Rows handed from the CSV reader to the store at a time.
    #[arg(long = "batch-size", value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// CSV field delimiter.
    #[arg(long = "delimiter", value_name = "CHAR", default_value_t = ',')]
    pub delimiter: char,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// SQLite database file to read.
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// JSON schema declaration describing the tables.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Tables per batch, or rows per batch with --row-batches.
    #[arg(long = "batch-size", value_name = "N", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Bound batches by row count instead of table count.
    #[arg(long = "row-batches")]
    pub row_batches: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// SQLite database file to inspect.
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
