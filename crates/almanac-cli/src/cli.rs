//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Almanac: typed extraction of statistics from country fact strings
#[derive(Parser)]
#[command(name = "almanac")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a single value string as a quantity
    Quantity {
        /// Value text, e.g. "4.941 billion metric tonnes of CO2 (2022 est.)"
        #[arg(value_name = "TEXT")]
        text: String,

        /// Unit the value is expected to carry
        #[arg(short, long)]
        unit: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a single value string as a category list
    Categories {
        /// Value text, e.g. "Roman Catholic 47%, Muslim 4% (2020 est.)"
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the top-level tokens of an enumeration
    Tokenize {
        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Extract every registered field from a record file
    Extract {
        /// Path to the record file (JSON, JSON Lines, CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Field registry configuration (JSON)
        #[arg(long, value_name = "CONFIG")]
        fields: Option<PathBuf>,

        /// Output path (default: <file>.extracted.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Maximum number of records to extract
        #[arg(long)]
        max_records: Option<usize>,

        /// Fail on fields with no registered parser
        #[arg(long)]
        strict: bool,
    },

    /// List the registered fields
    Fields {
        /// Field registry configuration (JSON)
        #[arg(long, value_name = "CONFIG")]
        fields: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use json or csv.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}
