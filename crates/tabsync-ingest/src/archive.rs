//! Named byte streams read from an archive.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// One archive entry, readable once.
///
/// The reader borrows the source it came from; it is released when the entry
/// is dropped.
pub struct ArchiveEntry<'a> {
    name: String,
    reader: Box<dyn Read + 'a>,
}

impl<'a> ArchiveEntry<'a> {
    pub fn new(name: impl Into<String>, reader: Box<dyn Read + 'a>) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    /// Full entry path inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table this entry is loaded into, see [`table_name_for_entry`].
    pub fn table_name(&self) -> &str {
        table_name_for_entry(&self.name)
    }

    pub fn into_reader(self) -> Box<dyn Read + 'a> {
        self.reader
    }
}

impl std::fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Source of archive entries in archive order.
pub trait EntrySource {
    /// Returns the next file entry, or `None` once the archive is exhausted.
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry<'_>>>;
}

/// File name of an entry without directories and without its last extension.
///
/// `export/asset.csv` maps to `asset`, `a.b.csv` to `a.b` and `README` to
/// itself.
pub fn table_name_for_entry(entry_name: &str) -> &str {
    let file_name = entry_name
        .rsplit_once('/')
        .map_or(entry_name, |(_, file)| file);
    file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem)
}

/// Entries of a ZIP archive; directory entries are skipped.
pub struct ZipEntries<R> {
    archive: ZipArchive<R>,
    next: usize,
}

impl<R: Read + Seek> ZipEntries<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            next: 0,
        })
    }

    /// Number of entries in the central directory, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl ZipEntries<BufReader<File>> {
    /// Opens a ZIP file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> EntrySource for ZipEntries<R> {
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry<'_>>> {
        while self.next < self.archive.len() {
            let index = self.next;
            self.next += 1;
            let is_dir = self
                .archive
                .name_for_index(index)
                .is_none_or(|name| name.ends_with('/'));
            if is_dir {
                continue;
            }
            let file = self.archive.by_index(index)?;
            let name = file.name().to_string();
            return Ok(Some(ArchiveEntry::new(name, Box::new(file))));
        }
        Ok(None)
    }
}

/// In-memory entries, mostly for tests and callers that already hold the
/// file contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryEntries {
    entries: Vec<(String, Vec<u8>)>,
    next: usize,
}

impl MemoryEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.entries.push((name.into(), contents.into()));
    }

    #[must_use]
    pub fn with_entry(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.push(name, contents);
        self
    }

    /// Restarts iteration from the first entry.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

impl EntrySource for MemoryEntries {
    fn next_entry(&mut self) -> Result<Option<ArchiveEntry<'_>>> {
        let Some((name, contents)) = self.entries.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(ArchiveEntry::new(
            name.clone(),
            Box::new(contents.as_slice()),
        )))
    }
}
