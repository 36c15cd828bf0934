//! Integration tests for Almanac.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use almanac::{
    Almanac, AlmanacConfig, AlmanacError, DiagnosticKind, ExtractionResult, FieldKind,
    FieldRegistry, Magnitude, ReaderConfig, Severity,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Helper to create a temporary file with a given extension.
fn create_test_file_with_suffix(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

// =============================================================================
// Input Format Tests
// =============================================================================

#[test]
fn test_extract_json_array() {
    let content = r#"[
        {"name": "Japan", "Coastline": "29,751 km", "Religions": "Shintoism 48.6%, Buddhism 46.4%, Christianity 1.1%, other 3.9% (2021 est.)"},
        {"name": "Mongolia", "Coastline": "0 km (landlocked)", "Religions": "Buddhist 51.7%, Muslim 3.2%, none 40.6% (2020 est.)"}
    ]"#;
    let file = create_test_file(content);

    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");

    assert_eq!(result.source.format, "json");
    assert_eq!(result.source.record_count, 2);
    assert_eq!(result.source.field_count, 2);
    assert!(result.source.hash.starts_with("sha256:"));

    let japan = result.record("Japan").unwrap();
    let coastline = japan.get("coastline").unwrap().as_quantity().unwrap();
    assert_eq!(coastline.value, Some(29751.0));
    assert_eq!(coastline.unit.as_deref(), Some("km"));

    let mongolia = result.record("Mongolia").unwrap();
    let coastline = mongolia.get("coastline").unwrap().as_quantity().unwrap();
    assert_eq!(coastline.value, Some(0.0));

    let religions = mongolia.get("religions").unwrap().as_category_list().unwrap();
    assert_eq!(religions.entries.len(), 3);
    assert_eq!(religions.timestamp.as_deref(), Some("2020"));
}

#[test]
fn test_extract_nested_json_object() {
    let content = r#"{
        "Chile": {
            "Geography": {
                "Area": {"total": {"text": "756,102 sq km"}, "land": {"text": "743,812 sq km"}},
                "Coastline": {"text": "6,435 km"}
            },
            "Economy": {
                "Exports": {"text": "$104.567 billion (2023 est.)"}
            }
        }
    }"#;
    let file = create_test_file_with_suffix(content, ".json");

    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");
    let chile = &result.records[0];

    assert_eq!(chile.id, "Chile");
    assert_eq!(
        chile.get("area_total").unwrap().as_quantity().unwrap().value,
        Some(756102.0)
    );
    assert_eq!(chile.skipped, vec!["Geography/Area/land".to_string()]);

    let exports = chile.get("exports").unwrap().as_quantity().unwrap();
    assert_eq!(exports.magnitude, Magnitude::Billion);
    assert_eq!(exports.raw_value, Some(104.567));
    assert_eq!(exports.year, Some(2023));
    assert!(exports.is_estimate);
}

#[test]
fn test_extract_tsv_auto_detect() {
    let content = "country\tLanguages\tPopulation\n\
                   Belgium\tDutch (official) 60%, French (official) 40%\t11,977,634 (2024 est.)\n\
                   Malta\tMaltese (official) 90.1%, English (official) 6%, other 3.9% (2005 est.)\tNA\n";
    let file = create_test_file(content);

    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");

    assert_eq!(result.source.format, "tsv");
    assert_eq!(result.records.len(), 2);

    let belgium = result.record("Belgium").unwrap();
    let languages = belgium.get("languages").unwrap().as_category_list().unwrap();
    assert_eq!(languages.entries[0].name, "Dutch (official)");
    assert_eq!(languages.entries[0].percentage, Some(60.0));

    let malta = result.record("Malta").unwrap();
    assert!(malta.get("population").unwrap().is_absent());
}

#[test]
fn test_extract_json_lines() {
    let content = "{\"id\": \"Iceland\", \"Median age\": \"37.5 years (2024 est.)\"}\n\
                   {\"id\": \"Niger\", \"Median age\": \"14.8 years (2024 est.)\"}\n";
    let file = create_test_file_with_suffix(content, ".jsonl");

    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");

    assert_eq!(result.source.format, "jsonl");
    let niger = result.record("Niger").unwrap();
    let age = niger.get("median_age").unwrap().as_quantity().unwrap();
    assert_eq!(age.value, Some(14.8));
    assert_eq!(age.unit.as_deref(), Some("years"));
}

#[test]
fn test_explicit_id_field() {
    let content = "iso,Country,Coastline\nPT,Portugal,\"1,793 km\"\n";
    let file = create_test_file_with_suffix(content, ".csv");

    let config = AlmanacConfig::default().with_reader(ReaderConfig {
        id_field: Some("iso".to_string()),
        ..Default::default()
    });
    let result = Almanac::with_config(config)
        .extract_file(file.path())
        .expect("Extraction failed");

    let portugal = result.record("PT").unwrap();
    assert_eq!(
        portugal.get("coastline").unwrap().as_quantity().unwrap().value,
        Some(1793.0)
    );
    assert_eq!(portugal.skipped, vec!["Country".to_string()]);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_registry_from_config_file() {
    let config = r#"{
        "extends_builtin": false,
        "fields": [
            {"key": "Airports", "kind": "quantity", "expected_unit": "airports"},
            {"key": "Ports", "kind": "category_list", "aliases": ["major seaports"]}
        ]
    }"#;
    let config_file = create_test_file_with_suffix(config, ".json");
    let registry = FieldRegistry::from_json_file(config_file.path()).expect("Bad config");

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("major seaports").unwrap().kind, FieldKind::CategoryList);
    assert!(registry.get("religions").is_none());

    let data = r#"[{"name": "Norway", "Airports": "98 (2024)", "Religions": "Lutheran 65%"}]"#;
    let data_file = create_test_file_with_suffix(data, ".json");

    let almanac = Almanac::with_config(AlmanacConfig::default().with_registry(registry));
    let result = almanac.extract_file(data_file.path()).expect("Extraction failed");
    let norway = &result.records[0];

    let airports = norway.get("airports").unwrap();
    assert_eq!(airports.as_quantity().unwrap().value, Some(98.0));
    assert_eq!(airports.as_quantity().unwrap().year, Some(2024));
    // no unit on "98", so the expected unit is reported missing
    assert!(airports
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnitMismatch));
    assert_eq!(norway.skipped, vec!["Religions".to_string()]);
}

#[test]
fn test_strict_mode() {
    let data = r#"[{"name": "Norway", "Flag": "red with a blue cross"}]"#;
    let file = create_test_file_with_suffix(data, ".json");

    let almanac = Almanac::with_config(AlmanacConfig::default().with_strict(true));
    let err = almanac.extract_file(file.path()).unwrap_err();

    match err {
        AlmanacError::UnknownField { record, field } => {
            assert_eq!(record, "Norway");
            assert_eq!(field, "Flag");
        }
        other => panic!("Unexpected error: {}", other),
    }
}

// =============================================================================
// Diagnostics Tests
// =============================================================================

#[test]
fn test_warnings_are_collected() {
    let data = r#"[{"name": "X", "Exports": "not reported in dollars", "Religions": "Muslim 60% (Sunni 20%, Shia 10%)"}]"#;
    let file = create_test_file_with_suffix(data, ".json");

    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");
    let record = &result.records[0];

    let exports = record.get("exports").unwrap();
    assert!(exports.as_quantity().unwrap().value.is_none());
    assert!(exports
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::NoNumericValue));

    let religions = record.get("religions").unwrap();
    assert!(religions
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::SubcategorySumMismatch));
    assert!(religions.confidence() < 1.0);

    assert_eq!(result.count_severity(Severity::Warning), 1);
    assert_eq!(result.count_severity(Severity::Info), 1);
}

// =============================================================================
// Output Tests
// =============================================================================

#[test]
fn test_save_json_and_csv() {
    let data = r#"[{"name": "Peru", "Exports partners": "China 36%, US 13%, South Korea 5% (2022)", "Exports": "$67.64 billion (2023 est.)"}]"#;
    let file = create_test_file_with_suffix(data, ".json");
    let result = Almanac::new().extract_file(file.path()).expect("Extraction failed");

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("out.json");
    let csv_path = dir.path().join("out.csv");

    result.save(&json_path).expect("Save failed");
    result.save_csv(&csv_path).expect("Save failed");

    let loaded = ExtractionResult::load(&json_path).expect("Load failed");
    assert_eq!(loaded.records, result.records);

    let csv_text = std::fs::read_to_string(&csv_path).unwrap();
    // header + three partners + one export value
    assert_eq!(csv_text.lines().count(), 5);
    assert!(csv_text.contains("Peru,exports_partners,category_list,South Korea,,5.0,,%,2022,false"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_empty_file() {
    let file = create_test_file_with_suffix("", ".json");
    let result = Almanac::new().extract_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_empty_array() {
    let file = create_test_file_with_suffix("[]", ".json");
    let result = Almanac::new().extract_file(file.path());
    assert!(matches!(result, Err(AlmanacError::EmptyData(_))));
}

#[test]
fn test_malformed_json() {
    let file = create_test_file_with_suffix("[{\"name\": ", ".json");
    let result = Almanac::new().extract_file(file.path());
    assert!(matches!(result, Err(AlmanacError::Json(_))));
}

#[test]
fn test_nonexistent_file() {
    let result = Almanac::new().extract_file("/nonexistent/path/countries.json");
    assert!(matches!(result, Err(AlmanacError::Io { .. })));
}
