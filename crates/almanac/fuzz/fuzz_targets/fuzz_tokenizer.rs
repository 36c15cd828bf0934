//! Fuzz target for the delimiter-aware tokenizer.
//!
//! Tokens must always be trimmed and non-empty, whatever the nesting.

#![no_main]

use almanac::extract::{paren_balance, tokenize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = paren_balance(text);
        for token in tokenize(text) {
            assert!(!token.is_empty());
            assert_eq!(token.trim(), token);
        }
    }
});
