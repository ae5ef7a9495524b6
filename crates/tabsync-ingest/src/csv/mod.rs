//! CSV dialects and the streaming row reader.

mod format;
mod reader;

pub use format::CsvFormat;
pub use reader::{CsvRecord, InconsistentRecord, RowReader, normalize_header, parse};
