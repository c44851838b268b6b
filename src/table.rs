//! Marker entries and the CSV interchange table.
//!
//! The table has a `label,string` header and one row per marker entry.
//! Fields are quoted only when they contain delimiters, quotes or line
//! breaks.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Result, SketchError};

/// Header row of the interchange table
pub const HEADER: [&str; 2] = ["label", "string"];

/// One localizable string: the marker-prefixed name and its displayed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEntry {
    pub label: String,
    #[serde(rename = "string")]
    pub text: String,
}

impl MarkerEntry {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Ordered entries used to rewrite pages. Labels may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<MarkerEntry>,
}

impl LookupTable {
    pub fn new(entries: Vec<MarkerEntry>) -> Self {
        Self { entries }
    }

    /// Load a table from a CSV file, keeping only rows whose label starts
    /// with `prefix`.
    pub fn read_csv(path: &Path, prefix: &str) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| SketchError::TableParse {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Self::from_reader(file, prefix).map_err(|source| SketchError::TableParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse CSV rows positionally (label, then text); the first row is the
    /// header and is never treated as data.
    pub fn from_reader<R: Read>(reader: R, prefix: &str) -> csv::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record?;
            let entry: MarkerEntry = record.deserialize(None)?;
            if !entry.label.starts_with(prefix) {
                warn!(
                    "Skipping row with label '{}': it does not start with '{}'",
                    entry.label, prefix
                );
                continue;
            }
            entries.push(entry);
        }

        debug!("Loaded {} table entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[MarkerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries carrying `label`, in table order
    pub fn matching<'t>(&'t self, label: &'t str) -> impl Iterator<Item = &'t MarkerEntry> + 't {
        self.entries.iter().filter(move |entry| entry.label == label)
    }

    /// Distinct labels, in order of first appearance
    pub fn labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|entry| entry.label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }
}

impl FromIterator<MarkerEntry> for LookupTable {
    fn from_iter<I: IntoIterator<Item = MarkerEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Drop entries whose label was already seen; the first occurrence wins.
///
/// Returns the kept entries and how many were dropped.
pub fn dedup_first_wins(entries: Vec<MarkerEntry>) -> (Vec<MarkerEntry>, usize) {
    let total = entries.len();
    let mut seen = HashSet::new();
    let kept: Vec<MarkerEntry> = entries
        .into_iter()
        .filter(|entry| {
            let fresh = seen.insert(entry.label.clone());
            if !fresh {
                debug!("Dropping duplicate label '{}'", entry.label);
            }
            fresh
        })
        .collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// Write entries as CSV, header first, even when there are no entries.
pub fn to_writer<W: Write>(writer: W, entries: &[MarkerEntry]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(HEADER)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write entries to a CSV file, replacing it.
pub fn write_csv(path: &Path, entries: &[MarkerEntry]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| SketchError::TableWrite {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    to_writer(std::io::BufWriter::new(file), entries).map_err(|source| SketchError::TableWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let mut out = Vec::new();
        to_writer(&mut out, &[MarkerEntry::new("%%greeting", "Hello")]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "label,string\n%%greeting,Hello\n");
    }

    #[test]
    fn empty_table_still_has_header() {
        let mut out = Vec::new();
        to_writer(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "label,string\n");
    }

    #[test]
    fn quotes_only_when_needed() {
        let mut out = Vec::new();
        let entries = [
            MarkerEntry::new("%%a", "one, two"),
            MarkerEntry::new("%%b", "say \"hi\""),
            MarkerEntry::new("%%c", "line\nbreak"),
        ];
        to_writer(&mut out, &entries).unwrap();
        assert_eq!(
            String::from_utf8(out.clone()).unwrap(),
            "label,string\n%%a,\"one, two\"\n%%b,\"say \"\"hi\"\"\"\n%%c,\"line\nbreak\"\n"
        );

        let table = LookupTable::from_reader(out.as_slice(), "%%").unwrap();
        assert_eq!(table.entries(), &entries);
    }

    #[test]
    fn reader_skips_header_and_unmarked_labels() {
        let csv = "label,string\n%%title,Bonjour\nplain,ignored\n%%title,Salut\n";
        let table = LookupTable::from_reader(csv.as_bytes(), "%%").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.labels(), ["%%title"]);

        let texts: Vec<_> = table.matching("%%title").map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Bonjour", "Salut"]);
        assert_eq!(table.matching("%%missing").count(), 0);
    }

    #[test]
    fn reader_does_not_require_header_names() {
        let csv = "id,text\n%%x,X\n";
        let table = LookupTable::from_reader(csv.as_bytes(), "%%").unwrap();
        assert_eq!(table.entries(), &[MarkerEntry::new("%%x", "X")]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "label,string\n%%x,X,extra\n";
        assert!(LookupTable::from_reader(csv.as_bytes(), "%%").is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let entries = vec![
            MarkerEntry::new("%%a", "first"),
            MarkerEntry::new("%%b", "other"),
            MarkerEntry::new("%%a", "second"),
        ];
        let (kept, dropped) = dedup_first_wins(entries);
        assert_eq!(dropped, 1);
        assert_eq!(
            kept,
            [MarkerEntry::new("%%a", "first"), MarkerEntry::new("%%b", "other")]
        );
    }
}
