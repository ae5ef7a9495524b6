//! Diagnostics emitted while parsing and converting records.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::receiver::Receiver;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    /// CSV record whose field count differs from the header.
    InconsistentRecord,
    /// Text value the declared field type does not accept.
    InvalidFieldValue,
    /// Number of records routed for one table.
    BatchRecords,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::InconsistentRecord => "INCONSISTENT_RECORD",
            IssueKind::InvalidFieldValue => "INVALID_FIELD_VALUE",
            IssueKind::BatchRecords => "BATCH_RECORDS",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat diagnostic record; which attributes are set depends on `kind`.
///
/// - `InconsistentRecord`: `table_id`, `record_index`, `field_count`
/// - `InvalidFieldValue`: `table_id`, `field_id`, `field_value`
/// - `BatchRecords`: `table_id`, `record_count`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub table_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub record_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub field_value: Option<String>,
}

impl Issue {
    pub fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            table_id: None,
            field_id: None,
            record_index: None,
            field_count: None,
            record_count: None,
            field_value: None,
        }
    }

    pub fn inconsistent_record(table_id: u32, record_index: u64, field_count: usize) -> Self {
        Self {
            table_id: Some(table_id),
            record_index: Some(record_index),
            field_count: Some(field_count),
            ..Self::new(IssueKind::InconsistentRecord)
        }
    }

    /// Invalid value for a field; the table id is attached by the caller.
    pub fn invalid_field_value(field_id: u32, field_value: impl Into<String>) -> Self {
        Self {
            field_id: Some(field_id),
            field_value: Some(field_value.into()),
            ..Self::new(IssueKind::InvalidFieldValue)
        }
    }

    pub fn batch_records(table_id: u32, record_count: usize) -> Self {
        Self {
            table_id: Some(table_id),
            record_count: Some(record_count),
            ..Self::new(IssueKind::BatchRecords)
        }
    }

    #[must_use]
    pub fn with_table_id(mut self, table_id: u32) -> Self {
        self.table_id = Some(table_id);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind: {}", self.kind)?;
        if let Some(value) = self.table_id {
            write!(f, " table_id: {value}")?;
        }
        if let Some(value) = self.field_id {
            write!(f, " field_id: {value}")?;
        }
        if let Some(value) = self.record_index {
            write!(f, " record_index: {value}")?;
        }
        if let Some(value) = self.field_count {
            write!(f, " field_count: {value}")?;
        }
        if let Some(value) = self.record_count {
            write!(f, " record_count: {value}")?;
        }
        if let Some(value) = &self.field_value {
            write!(f, " field_value: {value:?}")?;
        }
        Ok(())
    }
}

/// Deduplicates issues and counts occurrences, keeping first-seen order.
#[derive(Debug, Clone, Default)]
pub struct IssueTally {
    entries: Vec<(Issue, usize)>,
    index: HashMap<Issue, usize>,
}

impl IssueTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence and returns the running count for that issue.
    pub fn record(&mut self, issue: Issue) -> usize {
        if let Some(&pos) = self.index.get(&issue) {
            let entry = &mut self.entries[pos];
            entry.1 += 1;
            return entry.1;
        }
        self.index.insert(issue.clone(), self.entries.len());
        self.entries.push((issue, 1));
        1
    }

    /// Distinct issues with their counts, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Issue, usize)> {
        self.entries.iter().map(|(issue, count)| (issue, *count))
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Occurrences per issue kind.
    pub fn by_kind(&self) -> BTreeMap<IssueKind, usize> {
        let mut totals = BTreeMap::new();
        for (issue, count) in &self.entries {
            *totals.entry(issue.kind).or_insert(0) += count;
        }
        totals
    }
}

impl Receiver<Issue> for IssueTally {
    fn receive(&mut self, issue: Issue) {
        self.record(issue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = Issue::inconsistent_record(1, 2, 73);
        assert_eq!(
            issue.to_string(),
            "kind: INCONSISTENT_RECORD table_id: 1 record_index: 2 field_count: 73"
        );
    }

    #[test]
    fn test_tally_counts_duplicates() {
        let mut tally = IssueTally::new();
        let bad = Issue::invalid_field_value(4, "X").with_table_id(1);
        assert_eq!(tally.record(bad.clone()), 1);
        assert_eq!(tally.record(Issue::batch_records(1, 2)), 1);
        assert_eq!(tally.record(bad.clone()), 2);

        assert_eq!(tally.distinct(), 2);
        assert_eq!(tally.total(), 3);
        let first = tally.iter().next().unwrap();
        assert_eq!(first, (&bad, 2));
        assert_eq!(tally.by_kind().get(&IssueKind::InvalidFieldValue), Some(&2));
    }

    #[test]
    fn test_issue_serializes_only_set_attributes() {
        let json = serde_json::to_string(&Issue::batch_records(2, 5)).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"BATCH_RECORDS","table_id":2,"record_count":5}"#
        );
    }
}
