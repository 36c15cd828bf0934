//! CLI command implementations.

pub mod categories;
pub mod extract;
pub mod fields;
pub mod quantity;
pub mod tokenize;

use std::path::PathBuf;

use almanac::{Diagnostic, FieldRegistry, Severity};
use colored::Colorize;

/// Load the registry from a config file, or the built-in one.
pub fn load_registry(fields: Option<PathBuf>) -> Result<FieldRegistry, Box<dyn std::error::Error>> {
    match fields {
        Some(path) => {
            if !path.exists() {
                return Err(format!("Field config not found: {}", path.display()).into());
            }
            Ok(FieldRegistry::from_json_file(&path)?)
        }
        None => Ok(FieldRegistry::builtin()),
    }
}

/// Print diagnostics, warnings highlighted.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!();
    println!("{}", "Diagnostics:".yellow().bold());
    for d in diagnostics {
        let label = format!("{:8}", d.severity.label());
        let label = match d.severity {
            Severity::Warning => label.yellow(),
            Severity::Info => label.blue(),
        };
        match &d.fragment {
            Some(fragment) => println!("  {} {} ({})", label, d.message, fragment.dimmed()),
            None => println!("  {} {}", label, d.message),
        }
    }
}
