//! Tokenize command - show how an enumeration splits.

use almanac::extract::{paren_balance, tokenize};
use colored::Colorize;

pub fn run(text: String) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = tokenize(&text);

    for (i, token) in tokens.iter().enumerate() {
        println!("{:>3}  {}", (i + 1).to_string().dimmed(), token);
    }

    let balance = paren_balance(&text);
    if !balance.is_balanced() {
        println!();
        println!(
            "{} parentheses do not balance ({:?})",
            "Warning:".yellow().bold(),
            balance
        );
    }

    Ok(())
}
