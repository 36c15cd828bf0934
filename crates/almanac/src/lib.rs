//! Almanac: typed extraction of statistics from country fact strings.
//!
//! Reference corpora about the world's countries store most facts as
//! loosely formatted text such as `"18.1% (2024 est.)"` or
//! `"Roman Catholic 47%, Muslim 4%"`. Almanac turns each such string into a
//! typed record using two reusable grammars:
//!
//! - a **quantity parser** for a value, its magnitude word, unit, reference
//!   year and estimate flag;
//! - a **category-list parser** for named categories with percentages and
//!   one level of parenthesized breakdown.
//!
//! Parsing never fails on content. Anything guessed or dropped is reported
//! through [`Diagnostic`]s instead of a logger.
//!
//! # Example
//!
//! ```
//! use almanac::{parse_category_list, parse_quantity, Magnitude};
//!
//! let co2 = parse_quantity("4.941 billion metric tonnes of CO2 (2022 est.)");
//! assert_eq!(co2.magnitude, Magnitude::Billion);
//! assert_eq!(co2.year, Some(2022));
//!
//! let religions = parse_category_list("Roman Catholic 47%, Muslim 4% (2020 est.)");
//! assert_eq!(religions.entries[1].percentage, Some(4.0));
//! ```
//!
//! Whole record files are handled by [`Almanac`]:
//!
//! ```no_run
//! use almanac::Almanac;
//!
//! let result = Almanac::new().extract_file("countries.json").unwrap();
//! println!("Records: {}", result.records.len());
//! ```

pub mod error;
pub mod extract;
pub mod field;
pub mod input;

mod almanac;
mod output;

pub use crate::almanac::{Almanac, AlmanacConfig, ExtractedRecord, ExtractionResult};
pub use error::{AlmanacError, Result};
pub use extract::{
    parse_category_list, parse_quantity, tokenize, CategoryEntry, CategoryList,
    CategoryListParser, Diagnostic, DiagnosticKind, Extraction, Magnitude, Quantity,
    QuantityParser, Severity,
};
pub use field::{FieldKind, FieldRegistry, FieldSpec, FieldValue};
pub use input::{RawRecord, ReaderConfig, RecordFormat, RecordReader, SourceMetadata};
