//! Main Almanac struct and public API.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AlmanacError, Result};
use crate::extract::{Diagnostic, Severity};
use crate::field::{normalize_key, FieldRegistry, FieldValue};
use crate::input::{field_name_suffixes, RawRecord, ReaderConfig, RecordReader, SourceMetadata};

/// Configuration for an extraction run.
#[derive(Debug, Clone)]
pub struct AlmanacConfig {
    /// Field registry deciding which parser handles which field.
    pub registry: FieldRegistry,
    /// Record reader configuration.
    pub reader: ReaderConfig,
    /// Maximum records to extract (None = all).
    pub max_records: Option<usize>,
    /// Fail on fields with no registered parser instead of skipping them.
    pub strict: bool,
}

impl Default for AlmanacConfig {
    fn default() -> Self {
        Self {
            registry: FieldRegistry::builtin(),
            reader: ReaderConfig::default(),
            max_records: None,
            strict: false,
        }
    }
}

impl AlmanacConfig {
    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = Some(max_records);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Fields extracted from one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Record identifier (country or region name).
    pub id: String,
    /// Parsed values keyed by registry key, in source order.
    pub fields: IndexMap<String, FieldValue>,
    /// Source field names with no registered parser.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl ExtractedRecord {
    /// Look up a parsed field by key, in any spelling.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(&normalize_key(key))
    }

    /// All diagnostics with the key of the field that produced them.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.fields
            .iter()
            .flat_map(|(key, value)| value.diagnostics().iter().map(move |d| (key.as_str(), d)))
    }
}

/// Result of extracting a record file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Metadata about the source file.
    pub source: SourceMetadata,
    /// One entry per input record, in input order.
    pub records: Vec<ExtractedRecord>,
}

impl ExtractionResult {
    /// Number of diagnostics of the given severity across all records.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .flat_map(|r| r.diagnostics())
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Number of parsed fields across all records.
    pub fn field_count(&self) -> usize {
        self.records.iter().map(|r| r.fields.len()).sum()
    }

    /// Find a record by id.
    pub fn record(&self, id: &str) -> Option<&ExtractedRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

/// The batch extraction engine.
pub struct Almanac {
    config: AlmanacConfig,
    reader: RecordReader,
}

impl Almanac {
    /// Create an Almanac instance with the built-in registry.
    pub fn new() -> Self {
        Self::with_config(AlmanacConfig::default())
    }

    /// Create an Almanac instance with custom configuration.
    pub fn with_config(config: AlmanacConfig) -> Self {
        let mut reader_config = config.reader.clone();
        if config.max_records.is_some() {
            reader_config.max_records = config.max_records;
        }
        let reader = RecordReader::with_config(reader_config);

        Self { config, reader }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.config.registry
    }

    /// Read a record file and extract every registered field.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<ExtractionResult> {
        let path = path.as_ref();

        let (raw_records, source) = self.reader.read_file(path)?;
        debug!(
            file = %source.file,
            format = %source.format,
            records = source.record_count,
            "loaded record file"
        );

        let records = self.extract_records(&raw_records)?;

        Ok(ExtractionResult { source, records })
    }

    /// Extract a batch of records, preserving order.
    pub fn extract_records(&self, records: &[RawRecord]) -> Result<Vec<ExtractedRecord>> {
        let limit = self.config.max_records.unwrap_or(usize::MAX);
        records
            .iter()
            .take(limit)
            .map(|record| self.extract_record(record))
            .collect()
    }

    /// Extract every registered field of one record.
    ///
    /// Nested field names are matched from the longest suffix down, so
    /// `Geography/Area/total` resolves through `area_total`.
    pub fn extract_record(&self, record: &RawRecord) -> Result<ExtractedRecord> {
        let mut fields = IndexMap::new();
        let mut skipped = Vec::new();

        for (name, text) in &record.fields {
            let spec = field_name_suffixes(name).find_map(|n| self.config.registry.get(n));

            let Some(spec) = spec else {
                if self.config.strict {
                    return Err(AlmanacError::UnknownField {
                        record: record.id.clone(),
                        field: name.clone(),
                    });
                }
                skipped.push(name.clone());
                continue;
            };

            if fields.contains_key(&spec.key) {
                // first occurrence wins
                debug!(record = %record.id, field = %name, key = %spec.key, "duplicate field");
                skipped.push(name.clone());
                continue;
            }

            let value = spec.extract(text.as_deref());
            for diagnostic in value.diagnostics() {
                if diagnostic.severity == Severity::Warning {
                    warn!(
                        record = %record.id,
                        field = %spec.key,
                        kind = diagnostic.kind.label(),
                        "{}",
                        diagnostic.message
                    );
                }
            }
            fields.insert(spec.key.clone(), value);
        }

        debug!(
            record = %record.id,
            extracted = fields.len(),
            skipped = skipped.len(),
            "extracted record"
        );

        Ok(ExtractedRecord {
            id: record.id.clone(),
            fields,
            skipped,
        })
    }
}

impl Default for Almanac {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DiagnosticKind;
    use crate::field::FieldSpec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn france() -> RawRecord {
        RawRecord::new("France")
            .with_field("Religions", Some("Roman Catholic 47%, Muslim 4%, none 33% (2021 est.)"))
            .with_field("Geography/Area/total", Some("643,801 sq km"))
            .with_field("Flag description", Some("three equal vertical bands"))
            .with_field("Coastline", None)
    }

    #[test]
    fn test_extract_record() {
        let almanac = Almanac::new();
        let result = almanac.extract_record(&france()).unwrap();

        assert_eq!(result.id, "France");
        assert_eq!(result.skipped, vec!["Flag description".to_string()]);

        let religions = result.get("religions").unwrap().as_category_list().unwrap();
        assert_eq!(religions.entries.len(), 3);
        assert!(religions.is_estimate);

        let area = result.get("area_total").unwrap().as_quantity().unwrap();
        assert_eq!(area.value, Some(643801.0));

        assert!(result.get("coastline").unwrap().is_absent());
    }

    #[test]
    fn test_strict_mode_rejects_unknown_field() {
        let almanac = Almanac::with_config(AlmanacConfig::default().with_strict(true));
        let err = almanac.extract_record(&france()).unwrap_err();
        assert!(matches!(
            err,
            AlmanacError::UnknownField { ref field, .. } if field == "Flag description"
        ));
    }

    #[test]
    fn test_duplicate_key_keeps_first() {
        let record = RawRecord::new("X")
            .with_field("area", Some("10 sq km"))
            .with_field("total area", Some("20 sq km"));
        let result = Almanac::new().extract_record(&record).unwrap();
        let area = result.get("area_total").unwrap().as_quantity().unwrap();
        assert_eq!(area.value, Some(10.0));
        assert_eq!(result.skipped, vec!["total area".to_string()]);
    }

    #[test]
    fn test_custom_registry() {
        let registry = FieldRegistry::new()
            .with_field(FieldSpec::quantity("flag_count").with_unit("flags"))
            .unwrap();
        let almanac = Almanac::with_config(AlmanacConfig::default().with_registry(registry));
        let record = RawRecord::new("X").with_field("Flag count", Some("3 km"));
        let result = almanac.extract_record(&record).unwrap();

        let value = result.get("flag_count").unwrap();
        assert!(value
            .diagnostics()
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnitMismatch));
    }

    #[test]
    fn test_extract_file_preserves_order_and_limit() {
        let content = r#"[
            {"name": "Peru", "Population": "32,440,172 (2024 est.)"},
            {"name": "Chad", "Population": "18,847,148 (2024 est.)"},
            {"name": "Fiji", "Population": "947,760 (2024 est.)"}
        ]"#;
        let file = create_test_file(content, ".json");

        let almanac = Almanac::with_config(AlmanacConfig::default().with_max_records(2));
        let result = almanac.extract_file(file.path()).unwrap();

        assert_eq!(result.source.format, "json");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0].id, "Peru");
        assert_eq!(result.records[1].id, "Chad");
        assert_eq!(result.field_count(), 2);
        assert_eq!(result.count_severity(Severity::Warning), 0);

        let chad = result.record("Chad").unwrap();
        let population = chad.get("population").unwrap().as_quantity().unwrap();
        assert_eq!(population.value, Some(18847148.0));
        assert_eq!(population.year, Some(2024));
    }

    #[test]
    fn test_extract_missing_file() {
        let result = Almanac::new().extract_file("/nonexistent/countries.json");
        assert!(matches!(result, Err(AlmanacError::Io { .. })));
    }
}
