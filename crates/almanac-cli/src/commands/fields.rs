//! Fields command - list the field registry.

use std::path::PathBuf;

use colored::Colorize;

use super::load_registry;

pub fn run(fields: Option<PathBuf>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = load_registry(fields)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&registry.to_config())?);
        return Ok(());
    }

    println!(
        "{} {} fields",
        "Registry:".cyan().bold(),
        registry.len().to_string().white().bold()
    );
    println!();

    for spec in registry.iter() {
        println!(
            "  {:45} {:14} {}",
            spec.key,
            spec.kind.label(),
            spec.expected_unit.as_deref().unwrap_or("").dimmed()
        );
        if !spec.aliases.is_empty() {
            println!("      aliases: {}", spec.aliases.join(", ").dimmed());
        }
    }

    Ok(())
}
