//! CSV dialect configuration.

use csv::{ReaderBuilder, Terminator};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// CSV dialect handed to the `csv` reader.
///
/// Headers are always read from the first record; the remaining settings map
/// one to one onto [`csv::ReaderBuilder`]. A `terminator` of `None` accepts
/// `\r`, `\n` and `\r\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    pub delimiter: char,
    pub quote: char,
    pub quoting: bool,
    pub double_quote: bool,
    pub escape: Option<char>,
    pub comment: Option<char>,
    pub terminator: Option<char>,
}

impl CsvFormat {
    /// Comma separated, double-quote quoting with doubled quotes as escapes.
    pub fn excel() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            quoting: true,
            double_quote: true,
            escape: None,
            comment: None,
            terminator: None,
        }
    }

    /// Tab separated variant of [`CsvFormat::excel`].
    pub fn tab_delimited() -> Self {
        Self {
            delimiter: '\t',
            ..Self::excel()
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: Option<char>) -> Self {
        self.comment = comment;
        self
    }

    /// Builds a reader configuration with headers on and ragged records
    /// allowed, so field count mismatches reach the caller as data.
    pub fn reader_builder(&self) -> Result<ReaderBuilder> {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .flexible(true)
            .delimiter(ascii("delimiter", self.delimiter)?)
            .quote(ascii("quote", self.quote)?)
            .quoting(self.quoting)
            .double_quote(self.double_quote)
            .escape(self.escape.map(|c| ascii("escape", c)).transpose()?)
            .comment(self.comment.map(|c| ascii("comment", c)).transpose()?);
        match self.terminator {
            Some(c) => builder.terminator(Terminator::Any(ascii("terminator", c)?)),
            None => builder.terminator(Terminator::CRLF),
        };
        Ok(builder)
    }
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self::excel()
    }
}

fn ascii(setting: &'static str, value: char) -> Result<u8> {
    u8::try_from(value)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(IngestError::InvalidFormat { setting, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_excel_defaults() {
        let format: CsvFormat = serde_json::from_str(r#"{"delimiter": ";"}"#).unwrap();
        assert_eq!(format, CsvFormat::excel().with_delimiter(';'));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let err = CsvFormat::excel().with_delimiter('§').reader_builder().unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidFormat {
                setting: "delimiter",
                value: '§'
            }
        ));
    }

    #[test]
    fn test_tab_delimited_reads_tabs() {
        let mut reader = CsvFormat::tab_delimited()
            .reader_builder()
            .unwrap()
            .from_reader("a\tb\n1\t2\n".as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.get(1), Some("2"));
    }
}
