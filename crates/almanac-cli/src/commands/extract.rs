//! Extract command - extract every registered field from a record file.

use std::path::PathBuf;

use almanac::{Almanac, AlmanacConfig, FieldValue, Severity};
use colored::Colorize;
use tracing::debug;

use super::load_registry;
use crate::cli::OutputFormat;

pub fn run(
    file: PathBuf,
    fields: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
    max_records: Option<usize>,
    strict: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        "Extracting".cyan().bold(),
        file.display().to_string().white()
    );

    let mut config = AlmanacConfig::default()
        .with_registry(load_registry(fields)?)
        .with_strict(strict);
    if let Some(max) = max_records {
        config = config.with_max_records(max);
    }

    let result = Almanac::with_config(config).extract_file(&file)?;

    if verbose {
        println!();
        for record in &result.records {
            println!("{}", record.id.yellow().bold());
            for (key, value) in &record.fields {
                let summary = match value {
                    _ if value.is_absent() => "not reported".dimmed().to_string(),
                    FieldValue::Quantity(e) => match e.record.value {
                        Some(v) => format!("{} {}", v, e.record.unit.as_deref().unwrap_or("")),
                        None => "no value".dimmed().to_string(),
                    },
                    FieldValue::CategoryList(e) => format!("{} entries", e.record.entries.len()),
                };
                println!("  {:40} {}", key, summary);
            }
        }
        println!();
    }

    let skipped: usize = result.records.iter().map(|r| r.skipped.len()).sum();
    println!(
        "Extracted {} fields from {} records ({} warnings, {} info, {} skipped)",
        result.field_count().to_string().white().bold(),
        result.records.len().to_string().white().bold(),
        result.count_severity(Severity::Warning).to_string().yellow(),
        result.count_severity(Severity::Info).to_string().blue(),
        skipped.to_string().dimmed()
    );

    let output_path = output.unwrap_or_else(|| {
        let mut p = file.clone();
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        p.set_file_name(format!("{}.extracted.{}", stem, format.extension()));
        p
    });

    debug!(path = %output_path.display(), format = %format, "writing output");
    match format {
        OutputFormat::Json => result.save(&output_path)?,
        OutputFormat::Csv => result.save_csv(&output_path)?,
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}
