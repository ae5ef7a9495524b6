//! Library side of the tabsync binary: schema files, logging, the archive
//! import pipeline and JSON export.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod pipeline;

pub use config::{ImportOptions, load_schema};
pub use error::PipelineError;
pub use export::{export_json_lines, row_to_json};
pub use pipeline::{ImportSummary, IssueLog, import_archive, import_into_database};
