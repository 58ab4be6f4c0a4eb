#![no_main]

use libfuzzer_sys::fuzz_target;
use mtreport::model::Formula;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsed formulas must re-parse to themselves
        if let Ok(formula) = Formula::parse(input) {
            let reparsed = Formula::parse(&formula.to_string());
            assert_eq!(reparsed.ok(), Some(formula));
        }
    }
});
