//! Scalar quantity extraction.
//!
//! Turns strings such as `"4.941 billion metric tonnes of CO2 (2022 est.)"`
//! into a [`Quantity`]. Extraction runs as independent passes in a fixed
//! order (estimate marker, reference year, magnitude word, leading number,
//! unit, percent fallback) because real values place years, scale words and
//! units inconsistently.
//!
//! # Example
//!
//! ```
//! use almanac::extract::{parse_quantity, Magnitude};
//!
//! let q = parse_quantity("4.941 billion metric tonnes of CO2 (2022 est.)");
//! assert_eq!(q.value, Some(4_941_000_000.0));
//! assert_eq!(q.magnitude, Magnitude::Billion);
//! assert_eq!(q.unit.as_deref(), Some("metric tonnes of CO2"));
//! assert_eq!(q.year, Some(2022));
//! assert!(q.is_estimate);
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::diagnostics::{Diagnostic, DiagnosticKind, Extraction};
use super::text::{
    collapse_whitespace, has_estimate, is_absent, parse_number, remove_empty_parens, split_note,
    trim_punctuation, ESTIMATE, YEAR_GROUP,
};
use super::tokenizer::paren_balance;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// Magnitude words, largest first so the biggest scale wins.
static MAGNITUDE_PATTERNS: Lazy<Vec<(Magnitude, Regex)>> = Lazy::new(|| {
    [
        Magnitude::Trillion,
        Magnitude::Billion,
        Magnitude::Million,
        Magnitude::Thousand,
    ]
    .into_iter()
    .map(|m| {
        let pattern = format!(r"(?i)\b{}s?\b", m.word());
        (m, Regex::new(&pattern).unwrap())
    })
    .collect()
});

/// The primary number at the start of the text, after an optional
/// `label:`, qualifier word, comparison sign, minus sign and currency symbol.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*
        (?:(?P<label>[a-z][a-z\ '/-]{0,40}?)\s*:\s*)?
        (?:(?P<qualifier>about|approximately|approx\.|around|nearly|almost|roughly|over|under|less\ than|more\ than|up\ to|at\ least)\s+)?
        (?P<sign>[<>~])?\s*
        (?P<neg>-)?\s*
        (?P<currency>(?:US)?\$|€|£|¥)?\s*
        (?P<number>-?\d+(?:,\d+)*(?:\.\d+)?)",
    )
    .unwrap()
});

/// A number after a few words of free text, as in `Estimated 5 km`.
static NEAR_START_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^\s*
        (?P<lead>[^\d()%]{1,40}?)\s*
        (?P<sign>[<>~])?\s*
        (?P<currency>(?:US)?\$|€|£|¥)?\s*
        (?P<number>-?\d+(?:,\d+)*(?:\.\d+)?)",
    )
    .unwrap()
});

/// A percentage anywhere in the text.
static PERCENT_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<number>-?\d+(?:,\d{3})*(?:\.\d+)?)\s*%").unwrap());

// =============================================================================
// TYPES
// =============================================================================

/// Scale word attached to a raw number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Magnitude {
    #[default]
    None,
    Thousand,
    Million,
    Billion,
    Trillion,
}

impl Magnitude {
    /// Factor applied to the raw value.
    pub fn multiplier(&self) -> f64 {
        match self {
            Magnitude::None => 1.0,
            Magnitude::Thousand => 1e3,
            Magnitude::Million => 1e6,
            Magnitude::Billion => 1e9,
            Magnitude::Trillion => 1e12,
        }
    }

    /// The scale word as it appears in text (empty for `None`).
    pub fn word(&self) -> &'static str {
        match self {
            Magnitude::None => "",
            Magnitude::Thousand => "thousand",
            Magnitude::Million => "million",
            Magnitude::Billion => "billion",
            Magnitude::Trillion => "trillion",
        }
    }

    /// Parse a scale word, case-insensitively.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "thousand" | "thousands" => Some(Magnitude::Thousand),
            "million" | "millions" => Some(Magnitude::Million),
            "billion" | "billions" => Some(Magnitude::Billion),
            "trillion" | "trillions" => Some(Magnitude::Trillion),
            _ => None,
        }
    }

    /// Find the largest scale word present in `text`.
    pub fn detect(text: &str) -> Self {
        MAGNITUDE_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(m, _)| *m)
            .unwrap_or_default()
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::None => write!(f, "none"),
            other => write!(f, "{}", other.word()),
        }
    }
}

/// A single extracted statistic.
///
/// When `value` is present and `magnitude` is not `None`,
/// `value == raw_value * magnitude.multiplier()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    /// Scaled value.
    pub value: Option<f64>,
    /// Number exactly as written, thousands separators removed.
    pub raw_value: Option<f64>,
    pub magnitude: Magnitude,
    pub unit: Option<String>,
    /// Reference year from the trailing parenthetical group.
    pub year: Option<i32>,
    pub is_estimate: bool,
}

impl Quantity {
    /// The canonical record for absent input.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.year.is_none() && self.unit.is_none() && !self.is_estimate
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Configurable quantity parser.
///
/// One parser serves every scalar field; the optional expected unit only
/// feeds diagnostics and never changes the extracted record.
#[derive(Debug, Clone, Default)]
pub struct QuantityParser {
    expected_unit: Option<String>,
}

impl QuantityParser {
    /// Create a parser with no unit expectation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a `UnitMismatch` when the unit does not contain `unit`.
    pub fn with_expected_unit(mut self, unit: impl Into<String>) -> Self {
        self.expected_unit = Some(unit.into());
        self
    }

    /// The unit this parser expects, if any.
    pub fn expected_unit(&self) -> Option<&str> {
        self.expected_unit.as_deref()
    }

    /// Parse a raw field value.
    pub fn parse(&self, text: Option<&str>) -> Extraction<Quantity> {
        let text = match text.map(str::trim) {
            Some(t) if !is_absent(t) => t,
            _ => {
                return Extraction::new(
                    Quantity::empty(),
                    vec![Diagnostic::info(
                        DiagnosticKind::AbsentInput,
                        "Value not reported",
                    )],
                )
            }
        };

        let mut diagnostics = Vec::new();

        let balance = paren_balance(text);
        if !balance.is_balanced() {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnbalancedParentheses,
                    format!("Parentheses do not balance ({:?})", balance),
                )
                .with_fragment(text),
            );
        }

        let is_estimate = has_estimate(text);
        let (value_text, note) = split_note(text);
        if let Some(note) = note {
            diagnostics.push(
                Diagnostic::info(DiagnosticKind::TrailingText, "Note after the value was not used")
                    .with_fragment(note),
            );
        }
        let (year, body) = strip_last_year_group(value_text);
        let magnitude = Magnitude::detect(&body);

        let mut quantity = Quantity {
            year,
            is_estimate,
            ..Quantity::default()
        };

        let number_match = LEADING_NUMBER.captures(&body).or_else(|| {
            let caps = NEAR_START_NUMBER.captures(&body)?;
            diagnostics.push(
                Diagnostic::info(DiagnosticKind::LeadingText, "Number follows leading text")
                    .with_fragment(caps["lead"].trim()),
            );
            Some(caps)
        });

        if let Some(caps) = number_match {
            let number = &caps["number"];
            let raw = parse_number(number).map(|n| {
                if caps.name("neg").is_some() && !number.starts_with('-') {
                    -n
                } else {
                    n
                }
            });

            let less_than = caps.name("sign").is_some_and(|s| s.as_str() == "<")
                || caps.name("qualifier").is_some_and(|q| {
                    let q = q.as_str().to_lowercase();
                    q == "less than" || q == "under"
                })
                || caps.name("lead").is_some_and(|lead| {
                    let lead = lead.as_str().to_lowercase();
                    matches!(lead.split_whitespace().last(), Some("under"))
                        || lead.trim_end().ends_with("less than")
                });
            if less_than {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::LessThanQualifier,
                        "Upper-bound qualifier present; value stored at face value",
                    )
                    .with_fragment(caps[0].trim()),
                );
            }

            let rest = &body[caps.get(0).map_or(0, |m| m.end())..];
            let mut unit = clean_unit(rest, magnitude);
            if let Some(currency) = caps.name("currency") {
                unit = Some(match unit {
                    Some(u) => format!("{} {}", currency.as_str(), u),
                    None => currency.as_str().to_string(),
                });
            }

            quantity.raw_value = raw;
            quantity.value = raw.map(|r| r * magnitude.multiplier());
            quantity.magnitude = magnitude;
            quantity.unit = unit;
        } else if let Some(caps) = PERCENT_ANYWHERE.captures(&body) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let raw = parse_number(&caps["number"]);

            diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::PercentFallback,
                    "No leading number; used the first percentage in the text",
                )
                .with_fragment(&body[whole.clone()]),
            );
            if body[..whole.start].trim_end().ends_with('<') {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::LessThanQualifier,
                        "Upper-bound qualifier present; value stored at face value",
                    )
                    .with_fragment(&body[whole]),
                );
            }

            quantity.raw_value = raw;
            quantity.value = raw;
            quantity.unit = Some("%".to_string());
        } else {
            diagnostics.push(
                Diagnostic::warning(DiagnosticKind::NoNumericValue, "No numeric value found")
                    .with_fragment(text),
            );
            return Extraction::new(quantity, diagnostics);
        }

        match (&quantity.unit, &self.expected_unit) {
            (None, expected) => {
                diagnostics.push(Diagnostic::info(
                    DiagnosticKind::MissingUnit,
                    "Number has no unit",
                ));
                if let Some(expected) = expected {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::UnitMismatch,
                        format!("Expected unit '{}', found none", expected),
                    ));
                }
            }
            (Some(unit), Some(expected))
                if !unit.to_lowercase().contains(&expected.to_lowercase()) =>
            {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnitMismatch,
                        format!("Expected unit '{}', found '{}'", expected, unit),
                    )
                    .with_fragment(unit.clone()),
                );
            }
            _ => {}
        }

        Extraction::new(quantity, diagnostics)
    }
}

/// Parse a value string into a [`Quantity`], never failing.
pub fn parse_quantity(text: &str) -> Quantity {
    QuantityParser::new().parse(Some(text)).into_record()
}

/// Remove the last date group from `text`, returning its year.
fn strip_last_year_group(text: &str) -> (Option<i32>, String) {
    match YEAR_GROUP.captures_iter(text).last() {
        Some(caps) => {
            let year = caps["year"].parse::<i32>().ok();
            let range = caps.get(0).map_or(0..0, |m| m.range());
            let body = format!("{} {}", &text[..range.start], &text[range.end..]);
            (year, collapse_whitespace(&body))
        }
        None => (None, collapse_whitespace(text)),
    }
}

/// Build the unit from the text following the number.
fn clean_unit(rest: &str, magnitude: Magnitude) -> Option<String> {
    let mut unit = rest.to_string();
    if magnitude != Magnitude::None {
        if let Some((_, pattern)) = MAGNITUDE_PATTERNS.iter().find(|(m, _)| *m == magnitude) {
            unit = pattern.replacen(&unit, 1, "").into_owned();
        }
    }
    unit = ESTIMATE.replace_all(&unit, "${digit}").into_owned();
    unit = remove_empty_parens(&unit);

    let unit = collapse_whitespace(&unit);
    let unit = trim_punctuation(&unit);
    if unit.is_empty() {
        None
    } else {
        Some(unit.to_string())
    }
}
