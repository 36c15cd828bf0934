//! Text helpers shared by the quantity and category-list parsers.

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// A reference date: optional month (with optional day) or fiscal-year prefix,
/// then a 4-digit year, optionally a split year such as `2019/20`.
const DATE: &str = r"(?:(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(?:\d{1,2},?\s+)?|fy\s*)?(?P<year>\d{4})(?:/\d{2,4})?";

/// Remainder of a date group. The year ends at a word boundary, or runs
/// straight into an estimate marker as in `(2024est.)`.
const DATE_REST: &str = r"(?P<rest>(?:[^()\w]|est)[^()]*)?";

/// Any parenthetical group that opens with a reference date.
pub(crate) static YEAR_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\(\s*(?P<date>{DATE}){DATE_REST}\)")).unwrap()
});

/// A date group at the very end of the text.
pub(crate) static TRAILING_YEAR_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\(\s*(?P<date>{DATE}){DATE_REST}\)\s*[.,;]?\s*$"
    ))
    .unwrap()
});

/// Estimate marker: `est`, `est.`, `estimate`, `estimated`, also glued to a
/// preceding digit. Replace with `$digit` to keep that digit.
pub(crate) static ESTIMATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\b|(?P<digit>\d))est(?:imated?)?\b\.?").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\)").unwrap());

/// `note:` / `note 1:` introducing a trailing remark.
static NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bnote(?:\s*\d+)?\s*:").unwrap());

// =============================================================================
// HELPERS
// =============================================================================

/// Check if a raw field value means "not reported".
///
/// `none` is not a sentinel; category lists use it as a category name.
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("n.a.")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
        || trimmed == "--"
}

/// Whether the text carries an estimate marker.
pub(crate) fn has_estimate(text: &str) -> bool {
    ESTIMATE.is_match(text)
}

/// Split off a trailing `note:` remark: `(value text, note)`.
pub(crate) fn split_note(text: &str) -> (&str, Option<String>) {
    match NOTE.find(text) {
        Some(m) => {
            let note = collapse_whitespace(&text[m.end()..]);
            let note = if note.is_empty() { None } else { Some(note) };
            (&text[..m.start()], note)
        }
        None => (text, None),
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Drop `()` left behind after removing words from a group.
pub(crate) fn remove_empty_parens(text: &str) -> String {
    EMPTY_PARENS.replace_all(text, " ").into_owned()
}

/// Trim whitespace and separator punctuation from both ends.
pub(crate) fn trim_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '-' | '/')
    })
}

/// Parse a number that may use `,` as a thousands separator.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', "").parse::<f64>().ok()
}
