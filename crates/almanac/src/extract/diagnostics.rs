//! Diagnostics reported alongside extracted records.
//!
//! Parsers never log. Anything worth a second look during offline quality
//! review is returned here and the caller decides what to do with it.

use serde::{Deserialize, Serialize};

/// Kind of extraction diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Input was missing, empty, or a "not available" sentinel.
    AbsentInput,
    /// No numeric value could be found.
    NoNumericValue,
    /// Value came from a percentage found later in the text.
    PercentFallback,
    /// A number was found with nothing describing its unit.
    MissingUnit,
    /// The unit differs from what the field expects.
    UnitMismatch,
    /// A `<` qualifier was present; the value is stored at face value.
    LessThanQualifier,
    /// Parentheses do not balance.
    UnbalancedParentheses,
    /// A list fragment with no usable name was dropped.
    DroppedFragment,
    /// A list had no percentages and was kept as free text.
    DescriptiveOnly,
    /// A percentage range was reduced to its lower bound.
    PercentageRange,
    /// Subcategory percentages do not add up to the parent percentage.
    SubcategorySumMismatch,
    /// Text around the value (a note or an embedded date) was not used.
    TrailingText,
    /// The number was preceded by free text rather than a label.
    LeadingText,
}

impl DiagnosticKind {
    /// Get a human-readable label for the diagnostic kind.
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::AbsentInput => "Absent Input",
            DiagnosticKind::NoNumericValue => "No Numeric Value",
            DiagnosticKind::PercentFallback => "Percent Fallback",
            DiagnosticKind::MissingUnit => "Missing Unit",
            DiagnosticKind::UnitMismatch => "Unit Mismatch",
            DiagnosticKind::LessThanQualifier => "Less-Than Qualifier",
            DiagnosticKind::UnbalancedParentheses => "Unbalanced Parentheses",
            DiagnosticKind::DroppedFragment => "Dropped Fragment",
            DiagnosticKind::DescriptiveOnly => "Descriptive Only",
            DiagnosticKind::PercentageRange => "Percentage Range",
            DiagnosticKind::SubcategorySumMismatch => "Subcategory Sum Mismatch",
            DiagnosticKind::TrailingText => "Trailing Text",
            DiagnosticKind::LeadingText => "Leading Text",
        }
    }
}

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected corpus variation, recorded for completeness.
    Info,
    /// Output is less rich than the input suggests; worth reviewing.
    Warning,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
        }
    }
}

/// A single note about how a string was (or was not) understood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// The piece of input the diagnostic refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl Diagnostic {
    /// Create an informational diagnostic.
    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Info,
            message: message.into(),
            fragment: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            fragment: None,
        }
    }

    /// Attach the offending input fragment.
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

/// A parsed record together with the diagnostics produced while parsing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction<T> {
    pub record: T,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Extraction<T> {
    /// Wrap a record with its diagnostics.
    pub fn new(record: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            record,
            diagnostics,
        }
    }

    /// Discard the diagnostics.
    pub fn into_record(self) -> T {
        self.record
    }

    /// Diagnostics at warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Whether the input was absent.
    pub fn is_absent(&self) -> bool {
        self.has(DiagnosticKind::AbsentInput)
    }

    /// Whether a diagnostic of the given kind was reported.
    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }

    /// Confidence in the extraction (0.0-1.0).
    ///
    /// Each warning costs 0.25 and each informational note 0.05. Absent input
    /// carries no evidence at all and scores 0.
    pub fn confidence(&self) -> f64 {
        if self.is_absent() {
            return 0.0;
        }
        let penalty: f64 = self
            .diagnostics
            .iter()
            .map(|d| match d.severity {
                Severity::Warning => 0.25,
                Severity::Info => 0.05,
            })
            .sum();
        (1.0 - penalty).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clean() {
        let extraction = Extraction::new((), Vec::new());
        assert_eq!(extraction.confidence(), 1.0);
        assert_eq!(extraction.warnings().count(), 0);
    }

    #[test]
    fn test_confidence_penalties() {
        let extraction = Extraction::new(
            (),
            vec![
                Diagnostic::warning(DiagnosticKind::UnitMismatch, "unit"),
                Diagnostic::info(DiagnosticKind::LessThanQualifier, "<"),
            ],
        );
        assert!((extraction.confidence() - 0.70).abs() < 1e-9);
        assert_eq!(extraction.warnings().count(), 1);
    }

    #[test]
    fn test_confidence_absent_is_zero() {
        let extraction = Extraction::new(
            (),
            vec![Diagnostic::info(DiagnosticKind::AbsentInput, "absent")],
        );
        assert!(extraction.is_absent());
        assert_eq!(extraction.confidence(), 0.0);
    }

    #[test]
    fn test_confidence_never_negative() {
        let diagnostics = (0..10)
            .map(|_| Diagnostic::warning(DiagnosticKind::NoNumericValue, "none"))
            .collect();
        assert_eq!(Extraction::new((), diagnostics).confidence(), 0.0);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
    }

    #[test]
    fn test_diagnostic_serializes_snake_case() {
        let d = Diagnostic::warning(DiagnosticKind::UnbalancedParentheses, "unclosed")
            .with_fragment("(a");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "unbalanced_parentheses");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["fragment"], "(a");
    }
}
