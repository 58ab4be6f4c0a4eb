#![no_main]

use libfuzzer_sys::fuzz_target;
use mtreport::annotate::annotate;
use mtreport::dataset::Dataset;

fuzz_target!(|data: &[u8]| {
    // Arbitrary CSV text must either load or fail cleanly
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(dataset) = Dataset::from_csv_str(input) {
            // Whatever loads must annotate or be rejected without panicking
            let _ = annotate(&dataset);
        }
    }
});
