#![no_main]

use benchdiff::extractor::parse_report;
use benchdiff::text::decode_lossy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Reports arrive as raw bytes from CI logs; decoding and extraction
    // must not panic on any input
    let text = decode_lossy(data);
    let _ = parse_report(&text);
});
