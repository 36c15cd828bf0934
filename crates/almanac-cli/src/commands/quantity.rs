//! Quantity command - parse one value string.

use almanac::{Magnitude, QuantityParser};
use colored::Colorize;

use super::print_diagnostics;

pub fn run(
    text: String,
    unit: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let parser = match unit {
        Some(u) => QuantityParser::new().with_expected_unit(u),
        None => QuantityParser::new(),
    };
    let extraction = parser.parse(Some(&text));

    if json_output {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    let q = &extraction.record;
    println!("{} {}", "Quantity".cyan().bold(), text.white());
    println!();

    match q.value {
        Some(value) => println!("  Value:      {}", value.to_string().white().bold()),
        None => println!("  Value:      {}", "none".dimmed()),
    }
    if q.magnitude != Magnitude::None {
        if let Some(raw) = q.raw_value {
            println!("  Raw value:  {} {}", raw, q.magnitude);
        }
    }
    println!("  Unit:       {}", q.unit.as_deref().unwrap_or("-"));
    match q.year {
        Some(year) => println!("  Year:       {}", year),
        None => println!("  Year:       -"),
    }
    println!("  Estimate:   {}", q.is_estimate);
    println!(
        "  Confidence: {:.0}%",
        extraction.confidence() * 100.0
    );

    print_diagnostics(&extraction.diagnostics);

    Ok(())
}
