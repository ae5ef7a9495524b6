//! Streaming CSV reader producing text rows.

use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Read;

use csv::ByteRecord;
use tabsync_model::{Field, FieldType, Row, TableSchema, Value};

use super::format::CsvFormat;
use crate::error::{IngestError, Result};

/// Data record whose field count differs from the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InconsistentRecord {
    /// 1-based data record number, header excluded.
    pub record_index: u64,
    pub field_count: usize,
    pub values: Vec<String>,
}

/// One parsed data record.
#[derive(Debug, Clone, PartialEq)]
pub enum CsvRecord {
    Row(Row),
    Inconsistent(InconsistentRecord),
}

/// Normalizes a header cell: strips a UTF-8 BOM and surrounding whitespace.
pub fn normalize_header(value: &str) -> &str {
    value.trim_start_matches('\u{feff}').trim()
}

/// Reads rows of one all-text table schema from CSV, one record at a time.
///
/// Only columns present in both the header and the schema are populated.
/// Values are trimmed and empty values leave the field absent. Bytes that are
/// not valid UTF-8 are replaced with U+FFFD rather than failing the read.
/// Blank lines are skipped by the `csv` parser, so they are neither reported
/// as inconsistent records nor counted in record numbers.
pub struct RowReader<'s, R> {
    schema: &'s TableSchema,
    reader: csv::Reader<R>,
    /// Header position of every schema field found in the header.
    columns: Vec<(usize, &'s Field)>,
    header_len: usize,
    record: ByteRecord,
    record_index: u64,
}

impl<'s, R: Read> RowReader<'s, R> {
    /// Reads the header of `reader` and maps it onto `schema`.
    pub fn new(schema: &'s TableSchema, reader: R, format: &CsvFormat) -> Result<Self> {
        if let Some(field) = schema
            .fields()
            .iter()
            .find(|field| field.field_type() != FieldType::String)
        {
            return Err(IngestError::NonTextColumn {
                table: schema.name().to_string(),
                field: field.name().to_string(),
                field_type: field.field_type(),
            });
        }

        let mut reader = format.reader_builder()?.from_reader(reader);
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|source| IngestError::Csv {
                table: schema.name().to_string(),
                source,
            })?
            .iter()
            .map(|cell| lossy(cell).into_owned())
            .collect();

        let mut seen = HashSet::with_capacity(headers.len());
        let mut columns = Vec::new();
        for (position, cell) in headers.iter().enumerate() {
            let name = normalize_header(cell);
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name) {
                return Err(IngestError::DuplicateHeader {
                    table: schema.name().to_string(),
                    name: name.to_string(),
                });
            }
            if let Some(field) = schema.field_by_name(name) {
                columns.push((position, field));
            }
        }
        let header_len = headers.len();
        tracing::debug!(
            table = schema.name(),
            header_columns = header_len,
            mapped_columns = columns.len(),
            "read CSV header"
        );

        Ok(Self {
            schema,
            reader,
            columns,
            header_len,
            record: ByteRecord::new(),
            record_index: 0,
        })
    }

    /// Number of fields in the header record.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Schema fields that were found in the header, in header order.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &'s Field> + '_ {
        self.columns.iter().map(|&(_, field)| field)
    }

    fn decode(&self) -> Result<CsvRecord> {
        if self.record.len() != self.header_len {
            return Ok(CsvRecord::Inconsistent(InconsistentRecord {
                record_index: self.record_index,
                field_count: self.record.len(),
                values: self.record.iter().map(|cell| lossy(cell).into_owned()).collect(),
            }));
        }
        let mut row = Row::new();
        for &(position, field) in &self.columns {
            let Some(cell) = self.record.get(position) else {
                continue;
            };
            let value = lossy(cell);
            let value = value.trim();
            if !value.is_empty() {
                row.set(field, Value::from(value))?;
            }
        }
        Ok(CsvRecord::Row(row))
    }
}

impl<R: Read> Iterator for RowReader<'_, R> {
    type Item = Result<CsvRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.record_index += 1;
                Some(self.decode())
            }
            Err(source) => Some(Err(IngestError::Csv {
                table: self.schema.name().to_string(),
                source,
            })),
        }
    }
}

fn lossy(cell: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(cell)
}

/// Shorthand for [`RowReader::new`].
pub fn parse<'s, R: Read>(
    schema: &'s TableSchema,
    reader: R,
    format: &CsvFormat,
) -> Result<RowReader<'s, R>> {
    RowReader::new(schema, reader, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TableSchema {
        TableSchema::new(
            "Produce",
            vec![
                Field::optional("produce_id", 1, FieldType::String),
                Field::optional("description", 2, FieldType::String),
                Field::optional("is_organic", 3, FieldType::String),
            ],
        )
        .unwrap()
    }

    fn rows(input: &str) -> Vec<CsvRecord> {
        let schema = schema();
        RowReader::new(&schema, input.as_bytes(), &CsvFormat::excel())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("\u{feff}produce_id "), "produce_id");
        assert_eq!(normalize_header("  name"), "name");
    }

    #[test]
    fn test_values_trimmed_and_empty_absent() {
        let records = rows("produce_id,description,is_organic\n 1 ,  ,Y\n");
        let CsvRecord::Row(row) = &records[0] else {
            panic!("expected row");
        };
        assert_eq!(row.get_by_number(1), Some(&Value::from("1")));
        assert_eq!(row.get_by_number(2), None);
        assert_eq!(row.get_by_number(3), Some(&Value::from("Y")));
    }

    #[test]
    fn test_unknown_header_columns_ignored() {
        let records = rows("extra,produce_id\nx,7\n");
        let CsvRecord::Row(row) = &records[0] else {
            panic!("expected row");
        };
        assert_eq!(row.len(), 1);
        assert_eq!(row.get_by_number(1), Some(&Value::from("7")));
    }

    #[test]
    fn test_short_record_is_inconsistent() {
        let records = rows("produce_id,description\n1,a\n2\n3,c\n");
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1],
            CsvRecord::Inconsistent(InconsistentRecord {
                record_index: 2,
                field_count: 1,
                values: vec!["2".to_string()],
            })
        );
        assert!(matches!(records[2], CsvRecord::Row(_)));
    }

    #[test]
    fn test_typed_schema_rejected() {
        let typed = TableSchema::new("T", vec![Field::optional("n", 1, FieldType::Int32)]).unwrap();
        let err = RowReader::new(&typed, "n\n1\n".as_bytes(), &CsvFormat::excel())
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::NonTextColumn { .. }));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let schema = schema();
        let err = RowReader::new(&schema, "a,b,a\n".as_bytes(), &CsvFormat::excel())
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::DuplicateHeader { name, .. } if name == "a"));
    }
}
