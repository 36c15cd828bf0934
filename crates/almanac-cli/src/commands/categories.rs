//! Categories command - parse one enumeration string.

use almanac::CategoryListParser;
use colored::Colorize;

use super::print_diagnostics;

pub fn run(text: String, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let extraction = CategoryListParser::new().parse(Some(&text));

    if json_output {
        println!("{}", serde_json::to_string_pretty(&extraction)?);
        return Ok(());
    }

    let list = &extraction.record;
    println!(
        "{} {} entries",
        "Category list:".cyan().bold(),
        list.entries.len().to_string().white().bold()
    );
    println!();

    for entry in &list.entries {
        match entry.percentage {
            Some(pct) => println!("  {:40} {:>7}%", entry.name, pct),
            None => println!("  {:40} {:>8}", entry.name, "-".dimmed()),
        }
        for sub in entry.subcategories.iter().flatten() {
            match sub.percentage {
                Some(pct) => println!("    {:38} {:>7}%", sub.name, pct),
                None => println!("    {:38} {:>8}", sub.name, "-".dimmed()),
            }
        }
    }

    if let Some(total) = list.percentage_total() {
        println!();
        println!("  Total:      {:.1}%", total);
    }
    if let Some(timestamp) = &list.timestamp {
        let est = if list.is_estimate { " (estimate)" } else { "" };
        println!("  Timestamp:  {}{}", timestamp, est);
    }
    if let Some(note) = &list.note {
        println!("  Note:       {}", note);
    }
    println!(
        "  Confidence: {:.0}%",
        extraction.confidence() * 100.0
    );

    print_diagnostics(&extraction.diagnostics);

    Ok(())
}
