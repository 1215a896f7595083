//! Raw tabular input
//!
//! The engine consumes a [`RawTable`]: a header row plus string cells, exactly
//! as a CSV export or a dashboard upload would provide it. Column interpretation
//! (required/optional columns, numeric parsing) happens in the normalizer.
//!
//! # Usage
//!
//! ```ignore
//! use flare::ingest::RawTable;
//!
//! let table = RawTable::from_csv_file(Path::new("campaigns.csv"))?;
//! let report = flare::process(&table)?;
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input has no header row")]
    MissingHeader,
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // "" is an escaped quote
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Header names are matched case-insensitively without surrounding whitespace.
fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

// ============================================================================
// RawTable
// ============================================================================

/// Header plus rows of untyped cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build from already-split cells. Headers are normalized; rows are not
    /// checked for width here (the normalizer reports ragged rows).
    pub fn new<H, S>(headers: H, rows: Vec<Vec<String>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|h| normalize_header(h.as_ref()))
                .collect(),
            rows,
        }
    }

    /// Parse CSV text. Blank lines are skipped.
    pub fn from_csv_str(text: &str) -> Result<Self, IngestError> {
        Self::from_lines(text.lines().map(str::to_string))
    }

    /// Parse CSV from any reader.
    pub fn from_csv_reader<R: Read>(reader: R, origin: &Path) -> Result<Self, IngestError> {
        let lines: Vec<String> = BufReader::new(reader)
            .lines()
            .collect::<Result<_, _>>()
            .map_err(|source| IngestError::Io {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_lines(lines.into_iter())
    }

    pub fn from_csv_file(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file, path)
    }

    fn from_lines(lines: impl Iterator<Item = String>) -> Result<Self, IngestError> {
        let mut lines = lines
            .map(|l| l.trim_end_matches('\r').to_string())
            .filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or(IngestError::MissingHeader)?;
        let headers = csv_split(&header);
        let rows = lines.map(|l| csv_split(&l)).collect();
        Ok(Self::new(headers, rows))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by (case-insensitive) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_header(name);
        self.headers.iter().position(|h| *h == name)
    }

    /// Copy of the table with the named columns removed.
    #[must_use]
    pub fn without_columns(&self, names: &[&str]) -> Self {
        let drop: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        let keep = |i: &usize| !drop.contains(i);
        Self {
            headers: self
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| keep(i))
                .map(|(_, h)| h.clone())
                .collect(),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .filter(|(i, _)| keep(i))
                        .map(|(_, c)| c.clone())
                        .collect()
                })
                .collect(),
        }
    }
}
