//! Fuzz target for record file reading.
//!
//! Feeds arbitrary bytes to every reader format and the full extraction
//! pipeline; errors are fine, panics are not.

#![no_main]

use almanac::{Almanac, RecordFormat, RecordReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let reader = RecordReader::new();
    let almanac = Almanac::new();
    for format in [
        RecordFormat::Json,
        RecordFormat::JsonLines,
        RecordFormat::Delimited(b','),
        RecordFormat::Delimited(b'\t'),
    ] {
        if let Ok(records) = reader.read_bytes(data, format) {
            let _ = almanac.extract_records(&records);
        }
    }
});
