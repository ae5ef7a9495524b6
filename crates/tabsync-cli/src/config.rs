//! Schema declaration files and import options.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tabsync_ingest::CsvFormat;
use tabsync_model::{DEFAULT_BATCH_SIZE, DatabaseSchema, SchemaDecl};

use crate::error::PipelineError;

/// Loads a JSON schema declaration and validates it.
pub fn load_schema(path: &Path) -> Result<DatabaseSchema, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::SchemaRead {
        path: path.to_path_buf(),
        source,
    })?;
    let decl: SchemaDecl =
        serde_json::from_str(&text).map_err(|source| PipelineError::SchemaParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(decl.into_database_schema()?)
}

/// Settings of one archive import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Rows per batch handed from the CSV reader to the store.
    pub batch_size: usize,
    pub csv_format: CsvFormat,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            csv_format: CsvFormat::excel(),
        }
    }
}

impl ImportOptions {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_csv_format(mut self, csv_format: CsvFormat) -> Self {
        self.csv_format = csv_format;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_schema_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "Inventory",
                "tables": [
                    {{"name": "asset", "number": 1, "columns": [
                        {{"name": "id", "number": 1, "type": "int64"}}
                    ]}}
                ]
            }}"#
        )
        .unwrap();

        let schema = load_schema(file.path()).unwrap();
        let (field, table) = schema.table("asset").unwrap();
        assert_eq!(field.number(), 1);
        assert_eq!(table.field_by_name("id").unwrap().number(), 1);
    }

    #[test]
    fn test_load_schema_reports_path_on_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_schema(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaParse { .. }));
    }

    #[test]
    fn test_import_options_defaults() {
        let options: ImportOptions = serde_json::from_str(r#"{"batch_size": 50}"#).unwrap();
        assert_eq!(options, ImportOptions::default().with_batch_size(50));
    }
}
