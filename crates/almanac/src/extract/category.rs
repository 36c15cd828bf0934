//! Nested categorical list extraction.
//!
//! Handles enumerations such as
//! `"Roman Catholic 47%, Muslim 4%, other 2%, none 22.8% (2020 est.)"` and
//! one level of parenthesized breakdown:
//! `"Christian 30% (Catholic 20%, Protestant 10%)"`.
//!
//! # Example
//!
//! ```
//! use almanac::extract::parse_category_list;
//!
//! let list = parse_category_list("Roman Catholic 47%, Muslim 4%, other 2%, none 22.8% (2020 est.)");
//! assert_eq!(list.entries.len(), 4);
//! assert_eq!(list.timestamp.as_deref(), Some("2020"));
//! assert!(list.is_estimate);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::diagnostics::{Diagnostic, DiagnosticKind, Extraction};
use super::text::{
    collapse_whitespace, has_estimate, is_absent, parse_number, remove_empty_parens, split_note,
    trim_punctuation, TRAILING_YEAR_GROUP, YEAR_GROUP,
};
use super::tokenizer::{paren_balance, Tokenizer};

/// Breakdown sums further than this from the parent are reported.
const SUM_TOLERANCE: f64 = 0.5;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

/// `<name> <pct>% (<breakdown>)`
static NESTED_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<name>.*?)\s*(?P<lt><)?\s*(?P<pct>\d+(?:,\d{3})*(?:\.\d+)?)(?:\s*-\s*(?P<hi>\d+(?:,\d{3})*(?:\.\d+)?))?\s*%\s*\((?P<inner>.*)\)\s*[.,;]?\s*$",
    )
    .unwrap()
});

/// `<name> <pct>%` with anything trailing captured separately.
static SIMPLE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?P<name>.*?)\s*(?P<lt><)?\s*(?P<pct>\d+(?:,\d{3})*(?:\.\d+)?)(?:\s*-\s*(?P<hi>\d+(?:,\d{3})*(?:\.\d+)?))?\s*%(?P<tail>.*)$",
    )
    .unwrap()
});

/// A name ending in a spelled-out "less than".
static LESS_THAN_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*\bless than$").unwrap());

// =============================================================================
// TYPES
// =============================================================================

/// One named category of an enumeration.
///
/// `percentage == None` always comes with `descriptive == true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub percentage: Option<f64>,
    /// Parenthesized breakdown following this entry's percentage.
    pub subcategories: Option<Vec<CategoryEntry>>,
    pub descriptive: bool,
}

impl CategoryEntry {
    /// Create an entry backed by a percentage.
    pub fn with_percentage(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage: Some(percentage),
            subcategories: None,
            descriptive: false,
        }
    }

    /// Create a free-text entry with no numeric evidence.
    pub fn descriptive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            percentage: None,
            subcategories: None,
            descriptive: true,
        }
    }

    /// Attach a subcategory breakdown.
    pub fn with_subcategories(mut self, subcategories: Vec<CategoryEntry>) -> Self {
        self.subcategories = Some(subcategories);
        self
    }

    /// Sum of the subcategory percentages, if any carry one.
    pub fn subcategory_total(&self) -> Option<f64> {
        let subs = self.subcategories.as_ref()?;
        let mut pcts = subs.iter().filter_map(|s| s.percentage).peekable();
        pcts.peek()?;
        Some(pcts.sum())
    }
}

/// A parsed enumeration with its corpus-level date metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryList {
    pub entries: Vec<CategoryEntry>,
    /// Date text of the trailing `(YYYY [est.])` group.
    pub timestamp: Option<String>,
    pub is_estimate: bool,
    pub note: Option<String>,
    /// Trimmed input; `None` when the input was absent.
    pub raw: Option<String>,
}

impl CategoryList {
    /// The canonical record for absent input.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&CategoryEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Sum of the top-level percentages, if any entry carries one.
    pub fn percentage_total(&self) -> Option<f64> {
        let mut pcts = self.entries.iter().filter_map(|e| e.percentage).peekable();
        pcts.peek()?;
        Some(pcts.sum())
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Category-list parser.
#[derive(Debug, Clone, Default)]
pub struct CategoryListParser {
    tokenizer: Tokenizer,
}

impl CategoryListParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom tokenizer for splitting entries.
    pub fn with_tokenizer(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Parse a raw field value.
    pub fn parse(&self, text: Option<&str>) -> Extraction<CategoryList> {
        let text = match text.map(str::trim) {
            Some(t) if !is_absent(t) => t,
            _ => {
                return Extraction::new(
                    CategoryList::empty(),
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

        let (body, note) = split_note(text);
        let (body, timestamp, is_estimate) = strip_trailing_date(body);
        let body = collapse_whitespace(trim_punctuation(&body));

        let entries = if body.is_empty() {
            Vec::new()
        } else if !body.contains('%') {
            diagnostics.push(Diagnostic::info(
                DiagnosticKind::DescriptiveOnly,
                "No percentages; kept as a single descriptive entry",
            ));
            vec![CategoryEntry::descriptive(body)]
        } else {
            self.tokenizer
                .split(&body)
                .iter()
                .filter_map(|token| self.classify(token, &mut diagnostics))
                .collect()
        };

        let list = CategoryList {
            entries,
            timestamp,
            is_estimate,
            note,
            raw: Some(text.to_string()),
        };
        Extraction::new(list, diagnostics)
    }

    /// Classify one top-level token, most specific pattern first.
    fn classify(&self, token: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<CategoryEntry> {
        if let Some(caps) = NESTED_ENTRY.captures(token) {
            let inner = &caps["inner"];
            if inner.contains('%') {
                let (name, pct) = name_and_percentage(&caps, token, diagnostics);
                let Some(name) = name else {
                    drop_fragment(token, diagnostics);
                    return None;
                };
                let subcategories: Vec<CategoryEntry> = self
                    .tokenizer
                    .split(inner)
                    .iter()
                    .filter_map(|piece| classify_simple(piece, diagnostics))
                    .collect();

                let entry = CategoryEntry::with_percentage(name, pct).with_subcategories(subcategories);
                check_breakdown_sum(&entry, diagnostics);
                return Some(entry);
            }

            // A parenthetical without percentages is a qualifier, not a breakdown.
            let (name, pct) = name_and_percentage(&caps, token, diagnostics);
            let qualifier = collapse_whitespace(inner);
            let name = match name {
                Some(name) if qualifier.is_empty() => name,
                Some(name) => strip_inner_dates(&format!("{} ({})", name, qualifier), diagnostics),
                None if !qualifier.is_empty() => {
                    let name = strip_inner_dates(&format!("({})", qualifier), diagnostics);
                    let bare = name.strip_prefix('(').and_then(|s| s.strip_suffix(')'));
                    collapse_whitespace(bare.unwrap_or(&name))
                }
                None => String::new(),
            };
            if name.is_empty() {
                drop_fragment(token, diagnostics);
                return None;
            }
            return Some(CategoryEntry::with_percentage(name, pct));
        }

        classify_simple(token, diagnostics)
    }
}

/// Parse an enumeration into a [`CategoryList`], never failing.
pub fn parse_category_list(text: &str) -> CategoryList {
    CategoryListParser::new().parse(Some(text)).into_record()
}

/// Simple pattern, then descriptive fallback. Never recurses.
fn classify_simple(token: &str, diagnostics: &mut Vec<Diagnostic>) -> Option<CategoryEntry> {
    let Some(caps) = SIMPLE_ENTRY.captures(token) else {
        let name = trim_punctuation(token);
        if name.is_empty() {
            drop_fragment(token, diagnostics);
            return None;
        }
        return Some(CategoryEntry::descriptive(collapse_whitespace(name)));
    };

    let (name, pct) = name_and_percentage(&caps, token, diagnostics);
    let tail = collapse_whitespace(trim_punctuation(caps.name("tail").map_or("", |m| m.as_str())));

    let name = match name {
        Some(name) => {
            if !tail.is_empty() {
                diagnostics.push(
                    Diagnostic::info(DiagnosticKind::TrailingText, "Text after the percentage was ignored")
                        .with_fragment(tail),
                );
            }
            name
        }
        // percentage-first form: "47% Roman Catholic"
        None if !tail.is_empty() => tail,
        None => {
            drop_fragment(token, diagnostics);
            return None;
        }
    };

    Some(CategoryEntry::with_percentage(name, pct))
}

/// Pull the cleaned name and face-value percentage out of a match.
fn name_and_percentage(
    caps: &regex::Captures<'_>,
    token: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Option<String>, f64) {
    let pct = parse_number(&caps["pct"]).unwrap_or_default();
    let mut less_than = caps.name("lt").is_some();

    let raw_name = caps.name("name").map_or("", |m| m.as_str());
    let mut name = trim_punctuation(raw_name).to_string();
    if LESS_THAN_SUFFIX.is_match(&name) {
        name = LESS_THAN_SUFFIX.replace(&name, "").into_owned();
        less_than = true;
    }
    let name = collapse_whitespace(trim_punctuation(&name));

    if less_than {
        diagnostics.push(
            Diagnostic::info(
                DiagnosticKind::LessThanQualifier,
                "Upper-bound qualifier present; percentage stored at face value",
            )
            .with_fragment(token.trim()),
        );
    }
    if caps.name("hi").is_some() {
        diagnostics.push(
            Diagnostic::info(
                DiagnosticKind::PercentageRange,
                "Percentage range stored as its lower bound",
            )
            .with_fragment(token.trim()),
        );
    }

    let name = if name.is_empty() { None } else { Some(name) };
    (name, pct)
}

fn check_breakdown_sum(entry: &CategoryEntry, diagnostics: &mut Vec<Diagnostic>) {
    if let (Some(total), Some(pct)) = (entry.subcategory_total(), entry.percentage) {
        if (total - pct).abs() > SUM_TOLERANCE {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticKind::SubcategorySumMismatch,
                    format!(
                        "Breakdown of '{}' sums to {} but the entry is {}%",
                        entry.name, total, pct
                    ),
                )
                .with_fragment(entry.name.clone()),
            );
        }
    }
}

/// Remove date groups from inside an entry name.
fn strip_inner_dates(name: &str, diagnostics: &mut Vec<Diagnostic>) -> String {
    if !YEAR_GROUP.is_match(name) {
        return name.to_string();
    }
    for date in YEAR_GROUP.find_iter(name) {
        diagnostics.push(
            Diagnostic::info(DiagnosticKind::TrailingText, "Date inside the list was not used")
                .with_fragment(date.as_str()),
        );
    }
    let stripped = YEAR_GROUP.replace_all(name, " ");
    let stripped = remove_empty_parens(&stripped);
    collapse_whitespace(trim_punctuation(&stripped))
}

fn drop_fragment(token: &str, diagnostics: &mut Vec<Diagnostic>) {
    diagnostics.push(
        Diagnostic::info(DiagnosticKind::DroppedFragment, "Fragment has no category name")
            .with_fragment(token.trim()),
    );
}

/// Strip the date group ending the text: `(body, timestamp, is_estimate)`.
fn strip_trailing_date(text: &str) -> (String, Option<String>, bool) {
    match TRAILING_YEAR_GROUP.captures(text) {
        Some(caps) => {
            let start = caps.get(0).map_or(text.len(), |m| m.start());
            let timestamp = collapse_whitespace(&caps["date"]);
            let is_estimate = caps.name("rest").is_some_and(|m| has_estimate(m.as_str()));
            (text[..start].to_string(), Some(timestamp), is_estimate)
        }
        None => (text.to_string(), None, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Extraction<CategoryList> {
        CategoryListParser::new().parse(Some(text))
    }

    fn kinds(extraction: &Extraction<CategoryList>) -> Vec<DiagnosticKind> {
        extraction.diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_religions_with_trailing_year() {
        let list =
            parse_category_list("Roman Catholic 47%, Muslim 4%, other 2%, none 22.8% (2020 est.)");
        assert_eq!(list.entries.len(), 4);
        assert_eq!(list.timestamp.as_deref(), Some("2020"));
        assert!(list.is_estimate);
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("Roman Catholic", 47.0));
        assert_eq!(list.entries[3].name, "none");
        assert_eq!(list.entries[3].percentage, Some(22.8));
        assert!(list.entries.iter().all(|e| e.subcategories.is_none()));
    }

    #[test]
    fn test_nested_breakdown() {
        let list = parse_category_list("Name1 10%, Name2 20% (Sub1 15%, Sub2 5%)");
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.timestamp, None);

        let second = &list.entries[1];
        assert_eq!(second.name, "Name2");
        assert_eq!(second.percentage, Some(20.0));
        let subs = second.subcategories.as_ref().unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0], CategoryEntry::with_percentage("Sub1", 15.0));
        assert_eq!(second.subcategory_total(), Some(20.0));
    }

    #[test]
    fn test_breakdown_sum_mismatch_reported() {
        let extraction = extract("Christian 30% (Catholic 10%, Protestant 5%)");
        assert_eq!(extraction.record.entries[0].subcategory_total(), Some(15.0));
        assert!(kinds(&extraction).contains(&DiagnosticKind::SubcategorySumMismatch));
    }

    #[test]
    fn test_descriptive_only() {
        let extraction = extract("complex, interwoven");
        let list = &extraction.record;
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entries[0].name, "complex, interwoven");
        assert_eq!(list.entries[0].percentage, None);
        assert!(list.entries[0].descriptive);
        assert!(kinds(&extraction).contains(&DiagnosticKind::DescriptiveOnly));
    }

    #[test]
    fn test_absent() {
        let list = parse_category_list("NA");
        assert!(list.entries.is_empty());
        assert_eq!(list.raw, None);
        assert_eq!(list, CategoryList::empty());

        let extraction = CategoryListParser::new().parse(None);
        assert!(extraction.is_absent());
    }

    #[test]
    fn test_raw_is_trimmed_input() {
        let list = parse_category_list("  Hindu 79.8%, Muslim 14.2%  ");
        assert_eq!(list.raw.as_deref(), Some("Hindu 79.8%, Muslim 14.2%"));
    }

    #[test]
    fn test_mixed_descriptive_entries() {
        let list = parse_category_list("English (official) 70%, Spanish 20%, other, unspecified");
        assert_eq!(list.entries.len(), 4);
        assert_eq!(list.entries[0].name, "English (official)");
        assert_eq!(list.entries[0].percentage, Some(70.0));
        assert_eq!(list.entries[2], CategoryEntry::descriptive("other"));
        assert!(list.entries[3].descriptive);
    }

    #[test]
    fn test_qualifier_parenthetical_kept_in_name() {
        let list = parse_category_list("Muslim 4% (mostly Sunni), Christian 2%");
        assert_eq!(list.entries[0].name, "Muslim (mostly Sunni)");
        assert_eq!(list.entries[0].percentage, Some(4.0));
        assert!(list.entries[0].subcategories.is_none());
    }

    #[test]
    fn test_date_inside_list_not_in_name() {
        let extraction = extract("Muslim 4% (mostly Sunni) (2010 est.), other 1%");
        let list = &extraction.record;
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("Muslim (mostly Sunni)", 4.0));
        assert_eq!(list.timestamp, None);
        assert!(kinds(&extraction).contains(&DiagnosticKind::TrailingText));

        let list = parse_category_list("Muslim 4% (2010 est.), other 1% (2020 est.)");
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("Muslim", 4.0));
        assert_eq!(list.timestamp.as_deref(), Some("2020"));
    }

    #[test]
    fn test_thousands_separator_in_percentage() {
        let list = parse_category_list("x 1,000%, y 2.5%");
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("x", 1000.0));
        assert_eq!(list.entries[1], CategoryEntry::with_percentage("y", 2.5));

        let list = parse_category_list("growth 1,200-1,500%");
        assert_eq!(list.entries[0].percentage, Some(1200.0));
    }

    #[test]
    fn test_glued_estimate_timestamp() {
        let list = parse_category_list("Hindu 80%, Muslim 14% (2011est.)");
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[1], CategoryEntry::with_percentage("Muslim", 14.0));
        assert_eq!(list.timestamp.as_deref(), Some("2011"));
        assert!(list.is_estimate);
    }

    #[test]
    fn test_less_than_face_value() {
        let extraction = extract("Buddhist <1%, Hindu less than 1%, other 3%");
        let list = &extraction.record;
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("Buddhist", 1.0));
        assert_eq!(list.entries[1], CategoryEntry::with_percentage("Hindu", 1.0));
        let count = kinds(&extraction)
            .into_iter()
            .filter(|k| *k == DiagnosticKind::LessThanQualifier)
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_percentage_range_lower_bound() {
        let extraction = extract("Greek Orthodox (official) 81-90%, Muslim 2%");
        assert_eq!(extraction.record.entries[0].name, "Greek Orthodox (official)");
        assert_eq!(extraction.record.entries[0].percentage, Some(81.0));
        assert!(kinds(&extraction).contains(&DiagnosticKind::PercentageRange));
    }

    #[test]
    fn test_orphan_percentage_dropped() {
        let extraction = extract("22.8%, Muslim 4%");
        assert_eq!(extraction.record.entries.len(), 1);
        assert_eq!(extraction.record.entries[0].name, "Muslim");
        assert!(kinds(&extraction).contains(&DiagnosticKind::DroppedFragment));
    }

    #[test]
    fn test_percentage_first_form() {
        let list = parse_category_list("47% Roman Catholic, 4% Muslim");
        assert_eq!(list.entries[0], CategoryEntry::with_percentage("Roman Catholic", 47.0));
        assert_eq!(list.entries[1], CategoryEntry::with_percentage("Muslim", 4.0));
    }

    #[test]
    fn test_note_split_off() {
        let list = parse_category_list(
            "Protestant 52%, Roman Catholic 30% (2019 est.) note: data represent the population aged 15+",
        );
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.timestamp.as_deref(), Some("2019"));
        assert!(list.is_estimate);
        assert_eq!(
            list.note.as_deref(),
            Some("data represent the population aged 15+")
        );
    }

    #[test]
    fn test_month_timestamp_without_estimate() {
        let list = parse_category_list("Shia 60%, Sunni 40% (July 2021)");
        assert_eq!(list.timestamp.as_deref(), Some("July 2021"));
        assert!(!list.is_estimate);
    }

    #[test]
    fn test_only_date() {
        let list = parse_category_list("(2020 est.)");
        assert!(list.entries.is_empty());
        assert_eq!(list.timestamp.as_deref(), Some("2020"));
    }

    #[test]
    fn test_unbalanced_input_tolerated() {
        let extraction = extract("A 10%, B 20% (x 5%");
        assert_eq!(extraction.record.entries.len(), 2);
        assert_eq!(extraction.record.entries[1].name, "B");
        assert!(kinds(&extraction).contains(&DiagnosticKind::UnbalancedParentheses));

        let extraction = extract("A 10%), B 20%");
        assert_eq!(extraction.record.entries.len(), 2);
    }

    #[test]
    fn test_thousands_in_names_not_split() {
        let list = parse_category_list("speakers of 1,000 dialects 5%, other 95%");
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[0].name, "speakers of 1,000 dialects");
    }

    #[test]
    fn test_descriptive_invariant_holds() {
        let list = parse_category_list("A 10% (b, c 2%), d, e 5%");
        fn check(entries: &[CategoryEntry]) {
            for e in entries {
                assert_eq!(e.percentage.is_none(), e.descriptive, "{:?}", e);
                if let Some(subs) = &e.subcategories {
                    check(subs);
                }
            }
        }
        check(&list.entries);
    }

    #[test]
    fn test_lookup_and_total() {
        let list = parse_category_list("Hindu 79.8%, Muslim 14.2%, other 6%");
        assert_eq!(list.get("muslim").and_then(|e| e.percentage), Some(14.2));
        assert!(list.get("Jain").is_none());
        assert!((list.percentage_total().unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(parse_category_list("complex").percentage_total(), None);
    }

    #[test]
    fn test_serialized_keys() {
        let list = parse_category_list("A 10% (B 5%, C 5%) (2020 est.)");
        let json = serde_json::to_value(&list).unwrap();
        for key in ["entries", "timestamp", "is_estimate", "note", "raw"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        let entry = &json["entries"][0];
        for key in ["name", "percentage", "subcategories", "descriptive"] {
            assert!(entry.get(key).is_some(), "missing {}", key);
        }
    }
}
