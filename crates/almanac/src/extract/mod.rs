//! The extraction engine: turns loosely formatted statistic strings into
//! typed records.
//!
//! Two grammars cover the corpus:
//!
//! - [`parse_quantity`] for scalar values (`"4.941 billion metric tonnes of CO2 (2022 est.)"`)
//! - [`parse_category_list`] for enumerations (`"Roman Catholic 47%, Muslim 4% (2020 est.)"`)
//!
//! Both are pure functions. They never fail on content: malformed input
//! yields a less complete record, never an error. The parser structs
//! ([`QuantityParser`], [`CategoryListParser`]) additionally return
//! [`Diagnostic`]s describing anything that was guessed, dropped or missing.

mod category;
mod diagnostics;
mod quantity;
mod text;
mod tokenizer;

pub use category::{parse_category_list, CategoryEntry, CategoryList, CategoryListParser};
pub use diagnostics::{Diagnostic, DiagnosticKind, Extraction, Severity};
pub use quantity::{parse_quantity, Magnitude, Quantity, QuantityParser};
pub use text::is_absent;
pub use tokenizer::{paren_balance, tokenize, ParenBalance, Tokenizer, DEFAULT_DELIMITERS};
