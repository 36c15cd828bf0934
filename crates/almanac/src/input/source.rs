//! Raw records and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between the segments of a nested field name.
pub const PATH_SEPARATOR: char = '/';

/// Metadata about a record file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (json, jsonl, csv, tsv, etc.).
    pub format: String,
    /// Number of records read.
    pub record_count: usize,
    /// Number of distinct field names across all records.
    pub field_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        record_count: usize,
        field_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            record_count,
            field_count,
            loaded_at: Utc::now(),
        }
    }
}

/// One corpus record (one country or region): field name to raw text.
///
/// Nested source structure is kept in the field name as `/`-separated
/// segments, e.g. `Geography/Area/total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    pub fields: IndexMap<String, Option<String>>,
}

impl RawRecord {
    /// Create an empty record.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, text: Option<&str>) -> Self {
        self.insert(name, text.map(str::to_string));
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, text: Option<String>) {
        self.fields.insert(name.into(), text);
    }

    /// Raw text of a field; `None` if missing or null.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Candidate lookup names for a nested field, longest first.
///
/// `Geography/Area/total` yields `Geography/Area/total`, `Area/total`, `total`.
pub fn field_name_suffixes(name: &str) -> impl Iterator<Item = &str> {
    std::iter::once(name).chain(
        name.match_indices(PATH_SEPARATOR)
            .map(move |(i, _)| &name[i + PATH_SEPARATOR.len_utf8()..]),
    )
}
