//! Fuzz target for the category-list parser.
//!
//! Entries without a percentage must be descriptive, and breakdowns are
//! never more than one level deep.

#![no_main]

use almanac::CategoryListParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let extraction = CategoryListParser::new().parse(Some(text));
        for entry in &extraction.record.entries {
            assert_eq!(entry.percentage.is_none(), entry.descriptive);
            for sub in entry.subcategories.iter().flatten() {
                assert!(sub.subcategories.is_none());
            }
        }
    }
});
