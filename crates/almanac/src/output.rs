//! Saving extraction results as JSON or flattened CSV.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::almanac::ExtractionResult;
use crate::error::{AlmanacError, Result};
use crate::extract::{CategoryEntry, Severity};
use crate::field::FieldValue;

/// One row of the flattened CSV output.
///
/// Quantity fields produce one row; category lists produce one row per entry
/// and per subcategory.
#[derive(Debug, Serialize)]
struct FlatRow<'a> {
    record_id: &'a str,
    field: &'a str,
    kind: &'static str,
    category: Option<&'a str>,
    subcategory: Option<&'a str>,
    value: Option<f64>,
    magnitude: Option<&'static str>,
    unit: Option<&'a str>,
    date: Option<String>,
    is_estimate: bool,
    confidence: f64,
    warnings: usize,
}

impl ExtractionResult {
    /// Save the full result, diagnostics included, as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent(path)?;

        let file = File::create(path).map_err(|e| AlmanacError::io(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        Ok(())
    }

    /// Load a result previously written by [`ExtractionResult::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AlmanacError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Save the result as a flattened CSV table.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        create_parent(path)?;

        let file = File::create(path).map_err(|e| AlmanacError::io(path, e))?;
        self.write_csv(BufWriter::new(file))
    }

    /// Write the flattened CSV table to any writer.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for record in &self.records {
            for (key, value) in &record.fields {
                for row in flatten(&record.id, key, value) {
                    csv_writer.serialize(row)?;
                }
            }
        }

        csv_writer
            .flush()
            .map_err(|e| AlmanacError::io("<csv output>", e))?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| AlmanacError::io(parent, e))?;
        }
    }
    Ok(())
}

fn flatten<'a>(record_id: &'a str, key: &'a str, value: &'a FieldValue) -> Vec<FlatRow<'a>> {
    let confidence = value.confidence();
    let warnings = value
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    let base = |kind: &'static str| FlatRow {
        record_id,
        field: key,
        kind,
        category: None,
        subcategory: None,
        value: None,
        magnitude: None,
        unit: None,
        date: None,
        is_estimate: false,
        confidence,
        warnings,
    };

    match value {
        FieldValue::Quantity(extraction) => {
            let q = &extraction.record;
            vec![FlatRow {
                value: q.value,
                magnitude: q.value.map(|_| q.magnitude.word()),
                unit: q.unit.as_deref(),
                date: q.year.map(|y| y.to_string()),
                is_estimate: q.is_estimate,
                ..base("quantity")
            }]
        }
        FieldValue::CategoryList(extraction) => {
            let list = &extraction.record;
            if list.entries.is_empty() {
                return vec![FlatRow {
                    date: list.timestamp.clone(),
                    is_estimate: list.is_estimate,
                    ..base("category_list")
                }];
            }

            let entry_row = |entry: &'a CategoryEntry, sub: Option<&'a CategoryEntry>| {
                let leaf = sub.unwrap_or(entry);
                FlatRow {
                    category: Some(entry.name.as_str()),
                    subcategory: sub.map(|s| s.name.as_str()),
                    value: leaf.percentage,
                    unit: leaf.percentage.map(|_| "%"),
                    date: list.timestamp.clone(),
                    is_estimate: list.is_estimate,
                    ..base("category_list")
                }
            };

            let mut rows = Vec::new();
            for entry in &list.entries {
                rows.push(entry_row(entry, None));
                for sub in entry.subcategories.iter().flatten() {
                    rows.push(entry_row(entry, Some(sub)));
                }
            }
            rows
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::almanac::Almanac;
    use crate::input::RawRecord;
    use crate::SourceMetadata;
    use tempfile::TempDir;

    fn sample_result() -> ExtractionResult {
        let record = RawRecord::new("Kenya")
            .with_field("Exports", Some("$9.84 billion (2023 est.)"))
            .with_field(
                "Ethnic groups",
                Some("Kikuyu 17.1%, Luhya 14.3%, other 1% (Somali 0.6%, Arab 0.4%) (2019 est.)"),
            );
        let records = Almanac::new().extract_records(&[record]).unwrap();
        let source = SourceMetadata::new(
            "kenya.json".into(),
            "sha256:0".to_string(),
            0,
            "json".to_string(),
            1,
            2,
        );
        ExtractionResult { source, records }
    }

    #[test]
    fn test_csv_rows() {
        let result = sample_result();
        let mut buffer = Vec::new();
        result.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("record_id,field,kind,category,subcategory,value"));
        // header, exports, three entries, two subcategories
        assert_eq!(lines.len(), 7);
        assert!(lines[1].starts_with("Kenya,exports,quantity,,,9840000000"));
        assert!(lines.iter().any(|l| l.starts_with("Kenya,ethnic_groups,category_list,other,Somali,0.6")));
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.json");

        let result = sample_result();
        result.save(&path).unwrap();

        let loaded = ExtractionResult::load(&path).unwrap();
        assert_eq!(loaded.records, result.records);
        assert_eq!(loaded.source.hash, "sha256:0");
    }

    #[test]
    fn test_save_csv_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("flat.csv");
        sample_result().save_csv(&path).unwrap();
        assert!(path.exists());
    }
}
