//! Example: Extract typed statistics from a country record file.
//!
//! Usage:
//!   cargo run --example extract -- <file_path>
//!
//! Example:
//!   cargo run --example extract -- data/countries.json

use std::env;
use std::path::Path;

use almanac::{Almanac, FieldValue, Severity};

fn main() -> almanac::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example extract -- <file_path>");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example extract -- data/countries.json");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Almanac Extraction: {}", file_path);
    println!("{}", separator);
    println!();

    let result = Almanac::new().extract_file(path)?;

    println!("## Source Metadata");
    println!("  File: {}", result.source.file);
    println!("  Format: {}", result.source.format);
    println!("  Records: {}", result.source.record_count);
    println!("  Distinct fields: {}", result.source.field_count);
    println!();

    for record in &result.records {
        println!("## {}", record.id);
        for (key, value) in &record.fields {
            match value {
                FieldValue::Quantity(e) => {
                    let q = &e.record;
                    println!(
                        "  {:32} {:>16} {:24} year={:?} est={}",
                        key,
                        q.value.map(|v| format!("{}", v)).unwrap_or_else(|| "-".to_string()),
                        q.unit.as_deref().unwrap_or(""),
                        q.year,
                        q.is_estimate
                    );
                }
                FieldValue::CategoryList(e) => {
                    let list = &e.record;
                    println!(
                        "  {:32} {} entries, timestamp={:?}",
                        key,
                        list.entries.len(),
                        list.timestamp
                    );
                    for entry in &list.entries {
                        match entry.percentage {
                            Some(pct) => println!("      {:30} {:>6}%", entry.name, pct),
                            None => println!("      {:30}", entry.name),
                        }
                    }
                }
            }
            for diagnostic in value.diagnostics() {
                if diagnostic.severity == Severity::Warning {
                    println!("      ! {}: {}", diagnostic.kind.label(), diagnostic.message);
                }
            }
        }
        if !record.skipped.is_empty() {
            println!("  (skipped {} unregistered fields)", record.skipped.len());
        }
        println!();
    }

    println!("## Summary");
    println!("  Fields extracted: {}", result.field_count());
    println!("  Warnings: {}", result.count_severity(Severity::Warning));
    println!();

    println!("{}", separator);

    Ok(())
}
