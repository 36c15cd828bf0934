//! Fuzz target for the quantity parser.
//!
//! This fuzzer tests that the parser:
//! 1. Never panics on any input
//! 2. Keeps `value == raw_value * multiplier`
//! 3. Keeps confidence within [0, 1]

#![no_main]

use almanac::QuantityParser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let extraction = QuantityParser::new()
            .with_expected_unit("km")
            .parse(Some(text));

        let q = &extraction.record;
        if let (Some(value), Some(raw)) = (q.value, q.raw_value) {
            if raw.is_finite() {
                assert_eq!(value, raw * q.magnitude.multiplier());
            }
        }
        let confidence = extraction.confidence();
        assert!((0.0..=1.0).contains(&confidence));
    }
});
