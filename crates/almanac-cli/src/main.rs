//! Almanac CLI - extract typed statistics from country fact strings.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Quantity { text, unit, json } => commands::quantity::run(text, unit, json),

        Commands::Categories { text, json } => commands::categories::run(text, json),

        Commands::Tokenize { text } => commands::tokenize::run(text),

        Commands::Extract {
            file,
            fields,
            output,
            format,
            max_records,
            strict,
        } => commands::extract::run(file, fields, output, format, max_records, strict, cli.verbose),

        Commands::Fields { fields, json } => commands::fields::run(fields, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
