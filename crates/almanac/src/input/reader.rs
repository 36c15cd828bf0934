//! Record file reader with format and delimiter detection.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{AlmanacError, Result};
use super::source::{RawRecord, SourceMetadata, PATH_SEPARATOR};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Field names tried, in order, as the record identifier.
const ID_FIELDS: &[&str] = &["id", "name", "country"];

/// Supported record file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A JSON array of objects, or an object keyed by record id.
    Json,
    /// One JSON object per line.
    JsonLines,
    /// A wide delimited table: one row per record, one column per field.
    Delimited(u8),
}

impl RecordFormat {
    /// Short format name used in metadata.
    pub fn name(&self) -> &'static str {
        match self {
            RecordFormat::Json => "json",
            RecordFormat::JsonLines => "jsonl",
            RecordFormat::Delimited(b'\t') => "tsv",
            RecordFormat::Delimited(b',') => "csv",
            RecordFormat::Delimited(b';') => "csv-semicolon",
            RecordFormat::Delimited(b'|') => "psv",
            RecordFormat::Delimited(_) => "delimited",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(RecordFormat::Json),
            "jsonl" | "ndjson" => Some(RecordFormat::JsonLines),
            "csv" => Some(RecordFormat::Delimited(b',')),
            "tsv" | "tab" => Some(RecordFormat::Delimited(b'\t')),
            "psv" => Some(RecordFormat::Delimited(b'|')),
            _ => None,
        }
    }
}

/// Reader configuration.
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Format to use (None = auto-detect).
    pub format: Option<RecordFormat>,
    /// Field holding the record id (None = first of `id`, `name`, `country`,
    /// or the first column of a delimited table).
    pub id_field: Option<String>,
    /// Maximum records to read (None = all).
    pub max_records: Option<usize>,
}

/// Reads record files into [`RawRecord`]s.
pub struct RecordReader {
    config: ReaderConfig,
}

impl RecordReader {
    /// Create a reader with default configuration.
    pub fn new() -> Self {
        Self {
            config: ReaderConfig::default(),
        }
    }

    /// Create a reader with custom configuration.
    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a file and return its records and metadata.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<(Vec<RawRecord>, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| AlmanacError::io(path, e))?;
        let size_bytes = file
            .metadata()
            .map_err(|e| AlmanacError::io(path, e))?
            .len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| AlmanacError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let format = match self.config.format.or_else(|| RecordFormat::from_extension(path)) {
            Some(f) => f,
            None => detect_format(&contents)?,
        };

        let records = self.read_bytes(&contents, format)?;
        let field_count = distinct_field_count(&records);

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format.name().to_string(),
            records.len(),
            field_count,
        );

        Ok((records, metadata))
    }

    /// Read records from bytes in a known format.
    pub fn read_bytes(&self, bytes: &[u8], format: RecordFormat) -> Result<Vec<RawRecord>> {
        let mut records = match format {
            RecordFormat::Json => {
                let value: Value = serde_json::from_slice(bytes)?;
                self.records_from_json(value)?
            }
            RecordFormat::JsonLines => self.records_from_json_lines(bytes)?,
            RecordFormat::Delimited(delimiter) => self.records_from_delimited(bytes, delimiter)?,
        };

        if let Some(max) = self.config.max_records {
            records.truncate(max);
        }

        if records.is_empty() {
            return Err(AlmanacError::EmptyData("No records found".to_string()));
        }

        Ok(records)
    }

    fn records_from_json(&self, value: Value) -> Result<Vec<RawRecord>> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(self.record_from_object(map, None, i)),
                    other => Err(AlmanacError::UnsupportedFormat(format!(
                        "Record {} is a JSON {}, expected an object",
                        i + 1,
                        json_type(&other)
                    ))),
                })
                .collect(),
            Value::Object(map) => {
                if !map.is_empty() && map.values().all(Value::is_object) {
                    // keyed by record id
                    Ok(map
                        .into_iter()
                        .enumerate()
                        .filter_map(|(i, (id, item))| match item {
                            Value::Object(fields) => {
                                Some(self.record_from_object(fields, Some(id), i))
                            }
                            _ => None,
                        })
                        .collect())
                } else {
                    Ok(vec![self.record_from_object(map, None, 0)])
                }
            }
            other => Err(AlmanacError::UnsupportedFormat(format!(
                "Top-level JSON {} cannot hold records",
                json_type(&other)
            ))),
        }
    }

    fn records_from_json_lines(&self, bytes: &[u8]) -> Result<Vec<RawRecord>> {
        let reader = BufReader::new(bytes);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|e| AlmanacError::io("<input>", e))?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(max) = self.config.max_records {
                if records.len() >= max {
                    break;
                }
            }
            match serde_json::from_str::<Value>(&line)? {
                Value::Object(map) => {
                    let index = records.len();
                    records.push(self.record_from_object(map, None, index));
                }
                other => {
                    return Err(AlmanacError::UnsupportedFormat(format!(
                        "Line {} is a JSON {}, expected an object",
                        records.len() + 1,
                        json_type(&other)
                    )))
                }
            }
        }

        Ok(records)
    }

    fn records_from_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.trim().to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AlmanacError::EmptyData("No columns found".to_string()));
        }

        let id_index = match &self.config.id_field {
            Some(id) => headers.iter().position(|h| h.eq_ignore_ascii_case(id)),
            None => ID_FIELDS
                .iter()
                .find_map(|id| headers.iter().position(|h| h.eq_ignore_ascii_case(id))),
        }
        .unwrap_or(0);

        let mut records = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_records {
                if row_idx >= max {
                    break;
                }
            }

            let row = result?;
            let id = row
                .get(id_index)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("record_{}", row_idx + 1));

            let mut record = RawRecord::new(id);
            for (col, header) in headers.iter().enumerate() {
                if col == id_index {
                    continue;
                }
                let text = row
                    .get(col)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                record.insert(header.clone(), text);
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Turn a JSON object into a record, flattening nested objects.
    fn record_from_object(
        &self,
        mut map: Map<String, Value>,
        id: Option<String>,
        index: usize,
    ) -> RawRecord {
        let id = id.or_else(|| self.take_id(&mut map)).unwrap_or_else(|| format!("record_{}", index + 1));

        let mut record = RawRecord::new(id);
        for (key, value) in map {
            flatten_value(&mut record, key, value);
        }
        record
    }

    /// Remove and return the identifier field.
    fn take_id(&self, map: &mut Map<String, Value>) -> Option<String> {
        let candidates: Vec<&str> = match &self.config.id_field {
            Some(id) => vec![id.as_str()],
            None => ID_FIELDS.to_vec(),
        };
        for candidate in candidates {
            let key = map
                .keys()
                .find(|k| k.eq_ignore_ascii_case(candidate))
                .cloned();
            if let Some(key) = key {
                match map.get(&key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => {
                        let id = s.trim().to_string();
                        map.shift_remove(&key);
                        return Some(id);
                    }
                    Some(Value::Number(n)) => {
                        let id = n.to_string();
                        map.shift_remove(&key);
                        return Some(id);
                    }
                    _ => {}
                }
            }
        }
        None
    }
}

impl Default for RecordReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Add a JSON value to the record under `name`.
///
/// Objects carrying a `text` member are leaves (the text is the value);
/// other objects are flattened into `name/child` fields.
fn flatten_value(record: &mut RawRecord, name: String, value: Value) {
    match value {
        Value::Null => record.insert(name, None),
        Value::String(s) => {
            let s = s.trim().to_string();
            record.insert(name, if s.is_empty() { None } else { Some(s) });
        }
        Value::Number(n) => record.insert(name, Some(n.to_string())),
        Value::Bool(b) => record.insert(name, Some(b.to_string())),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            record.insert(name, if parts.is_empty() { None } else { Some(parts.join(", ")) });
        }
        Value::Object(mut map) => {
            if let Some(text) = map.shift_remove("text") {
                flatten_value(record, name, text);
                return;
            }
            for (key, child) in map {
                flatten_value(record, format!("{}{}{}", name, PATH_SEPARATOR, key), child);
            }
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn distinct_field_count(records: &[RawRecord]) -> usize {
    records
        .iter()
        .flat_map(|r| r.fields.keys())
        .collect::<HashSet<_>>()
        .len()
}

/// Detect the format of a file with no telling extension.
fn detect_format(bytes: &[u8]) -> Result<RecordFormat> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim_start();

    if trimmed.starts_with('[') {
        return Ok(RecordFormat::Json);
    }
    if trimmed.starts_with('{') {
        return Ok(if serde_json::from_str::<Value>(trimmed).is_ok() {
            RecordFormat::Json
        } else {
            RecordFormat::JsonLines
        });
    }

    Ok(RecordFormat::Delimited(detect_delimiter(bytes)?))
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(AlmanacError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Field text is full of commas, so consistency across lines matters
        // more than raw count. Tab gets a bonus as it rarely occurs in values.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
