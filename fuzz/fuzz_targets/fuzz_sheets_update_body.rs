//! Fuzz target: JSON deserialization of `UpdateValuesBody`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_sheets::routes::UpdateValuesBody;

fuzz_target!(|data: &[u8]| {
    // Errors are expected; panics are not.
    let _ = serde_json::from_slice::<UpdateValuesBody>(data);
});
